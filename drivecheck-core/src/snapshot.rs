//! Read-only per-frame projections handed to the presentation layer.

use serde::Serialize;

use crate::action::{DriveAction, DriveMode};
use crate::phase::{IllusionPhase, PerceptionPhase, PumpPhase};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerceptionSnapshot {
    pub phase: PerceptionPhase,
    pub elapsed_ms: f64,
    pub position_x: f64,
    pub car_visible: bool,
    /// Digit shown while counting down.
    pub countdown: Option<u32>,
    pub collided: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PumpSnapshot {
    pub phase: PumpPhase,
    pub elapsed_ms: f64,
    pub level_pct: f64,
    pub pumps: u32,
    pub trial_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IllusionSnapshot {
    pub phase: IllusionPhase,
    pub elapsed_ms: f64,
    pub scenario_id: u32,
    pub mode: DriveMode,
    pub hazard_x: f64,
    pub lane: u8,
    pub action: Option<DriveAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Snapshot {
    Perception(PerceptionSnapshot),
    FuelPump(PumpSnapshot),
    Illusion(IllusionSnapshot),
}

impl Snapshot {
    pub fn elapsed_ms(&self) -> f64 {
        match self {
            Self::Perception(s) => s.elapsed_ms,
            Self::FuelPump(s) => s.elapsed_ms,
            Self::Illusion(s) => s.elapsed_ms,
        }
    }

    pub fn phase_label(&self) -> &'static str {
        use crate::phase::TrialPhase;
        match self {
            Self::Perception(s) => s.phase.label(),
            Self::FuelPump(s) => s.phase.label(),
            Self::Illusion(s) => s.phase.label(),
        }
    }
}
