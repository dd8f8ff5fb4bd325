use serde::{Deserialize, Serialize};

use crate::action::{DriveAction, DriveMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Perception,
    FuelPump,
    Illusion,
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Perception => "perception",
            Self::FuelPump => "fuel_pump",
            Self::Illusion => "illusion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceptionOutcome {
    Success,
    Fail,
}

/// What ended a perception trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceptionTermination {
    Stopped,
    Collision,
}

/// Recorded result of one perception trial. Timestamps are clock milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionResult {
    pub outcome: PerceptionOutcome,
    pub termination: PerceptionTermination,
    pub visible_ms: u64,
    pub hidden_ms: u64,
    pub speed_px_per_s: f64,
    pub started_at_ms: f64,
    pub hide_at_ms: Option<f64>,
    pub stop_at_ms: Option<f64>,
    pub collision_at_ms: Option<f64>,
    pub position_at_stop: f64,
    pub distance_to_obstacle: f64,
    /// Only present when the car was hidden before the stop.
    pub reaction_latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PumpOutcome {
    Stopped,
    Exploded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpResult {
    pub outcome: PumpOutcome,
    pub pumps: u32,
    /// Points banked by this trial; zero when the tank blew.
    pub points: u32,
    pub elapsed_ms: f64,
    pub blast_ms: u64,
    pub started_at_ms: Option<f64>,
    pub ended_at_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriveOutcome {
    Crash,
    NearMiss,
    SafePass,
}

impl DriveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crash => "crash",
            Self::NearMiss => "near-miss",
            Self::SafePass => "safe-pass",
        }
    }
}

/// Kind of follow-up question asked after a driving scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributionType {
    #[serde(rename = "A")]
    AssignResponsibility,
    #[serde(rename = "B")]
    ChooseConsequence,
    #[serde(rename = "C")]
    FutureBehaviour,
}

impl AttributionType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AssignResponsibility => "A",
            Self::ChooseConsequence => "B",
            Self::FutureBehaviour => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllusionResult {
    pub scenario_id: u32,
    pub scenario_title: String,
    pub mode: DriveMode,
    /// `None` when nothing was pressed before the scenario ran out.
    pub action: Option<DriveAction>,
    pub reaction_ms: Option<f64>,
    pub outcome: DriveOutcome,
    pub description: String,
    pub system_attribution: String,
    pub attribution_type: AttributionType,
    pub started_at_ms: f64,
    pub ended_at_ms: f64,
}

/// One completed trial, tagged by task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TrialResult {
    Perception(PerceptionResult),
    FuelPump(PumpResult),
    Illusion(IllusionResult),
}

impl TrialResult {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Perception(_) => TaskKind::Perception,
            Self::FuelPump(_) => TaskKind::FuelPump,
            Self::Illusion(_) => TaskKind::Illusion,
        }
    }
}

impl From<PerceptionResult> for TrialResult {
    fn from(result: PerceptionResult) -> Self {
        Self::Perception(result)
    }
}

impl From<PumpResult> for TrialResult {
    fn from(result: PumpResult) -> Self {
        Self::FuelPump(result)
    }
}

impl From<IllusionResult> for TrialResult {
    fn from(result: IllusionResult) -> Self {
        Self::Illusion(result)
    }
}
