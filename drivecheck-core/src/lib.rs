pub mod action;
pub mod error;
pub mod params;
pub mod phase;
pub mod session;
pub mod snapshot;
pub mod trial;

pub use action::{Action, DriveAction, DriveMode};
pub use error::ConfigError;
pub use params::{CountdownSpec, DurationBounds, IllusionParams, LaneGeometry, PerceptionParams, PumpParams};
pub use phase::{AssessmentStage, IllusionPhase, PerceptionPhase, Phase, PumpPhase, TrialPhase};
pub use session::{AttributionAnswer, ClientInfo, Participant, Session, SessionId};
pub use snapshot::{IllusionSnapshot, PerceptionSnapshot, PumpSnapshot, Snapshot};
pub use trial::{
    AttributionType, DriveOutcome, IllusionResult, PerceptionOutcome, PerceptionResult,
    PerceptionTermination, PumpOutcome, PumpResult, TaskKind, TrialResult,
};
