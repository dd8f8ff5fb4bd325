use serde::{Deserialize, Serialize};

/// Defines assessment stages and how they chain
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_task(&self) -> bool {
        false
    }

    fn is_complete(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStage {
    #[default]
    Intake,
    Perception,
    FuelPump,
    Illusion,
    Complete,
}

impl AssessmentStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Perception => "perception",
            Self::FuelPump => "fuel_pump",
            Self::Illusion => "illusion",
            Self::Complete => "complete",
        }
    }
}

impl Phase for AssessmentStage {
    fn allows_input(&self) -> bool {
        self.is_task()
    }

    fn next(&self) -> Option<Self> {
        use AssessmentStage::*;
        Some(match self {
            Intake => Perception,
            Perception => FuelPump,
            FuelPump => Illusion,
            Illusion => Complete,
            Complete => return None,
        })
    }

    fn is_task(&self) -> bool {
        matches!(self, Self::Perception | Self::FuelPump | Self::Illusion)
    }

    fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Lifecycle of one timed trial. Terminal states are absorbing and a trial
/// reaches exactly one of them.
pub trait TrialPhase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    /// Whether a qualifying input can be accepted in this phase.
    fn allows_input(&self) -> bool;
    fn is_terminal(&self) -> bool;
    fn label(&self) -> &'static str;

    /// Whether the frame clock drives this phase.
    fn is_animating(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceptionPhase {
    #[default]
    Idle,
    Countdown,
    Running,
    Hidden,
    Finished,
}

impl TrialPhase for PerceptionPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Running | Self::Hidden)
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Countdown => "countdown",
            Self::Running => "running",
            Self::Hidden => "hidden",
            Self::Finished => "finished",
        }
    }

    fn is_animating(&self) -> bool {
        matches!(self, Self::Countdown | Self::Running | Self::Hidden)
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PumpPhase {
    #[default]
    Ready,
    Pumping,
    Stopped,
    Exploded,
}

impl TrialPhase for PumpPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Ready | Self::Pumping)
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Exploded)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Pumping => "pumping",
            Self::Stopped => "stopped",
            Self::Exploded => "exploded",
        }
    }

    fn is_animating(&self) -> bool {
        matches!(self, Self::Pumping)
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllusionPhase {
    #[default]
    Playing,
    Finished,
}

impl TrialPhase for IllusionPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Playing)
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }

    fn is_animating(&self) -> bool {
        matches!(self, Self::Playing)
    }
}
