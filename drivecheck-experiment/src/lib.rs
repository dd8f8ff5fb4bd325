pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod latch;
pub mod outcome;
pub mod randomizer;
pub mod scenario;
pub mod task;

pub use assessment::{Assessment, AssessmentEvent, IllusionStep, Submission};
pub use config::{AssessmentConfig, IllusionConfig, PerceptionConfig, PumpConfig};
pub use engine::{Lifecycle, Trial};
pub use error::{EngineError, EngineResult};
pub use latch::{InputLatch, LatchedInput};
pub use randomizer::Randomizer;
pub use scenario::{OutcomeEntry, OutcomeTable, Scenario};
pub use task::{IllusionTask, PerceptionTask, PumpTask, Routing, Step, TimedTask};
