use drivecheck_core::ConfigError;
use thiserror::Error;

/// Programmer-facing misuse of the engine. Normal trial outcomes, including
/// failures like a collision, are never reported through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("trial has been torn down")]
    TornDown,

    #[error("trial has already been started")]
    AlreadyStarted,

    #[error("{operation} is not valid during the {stage} stage")]
    StageMismatch {
        operation: &'static str,
        stage: &'static str,
    },

    #[error("no active trial")]
    NoActiveTrial,

    #[error("attribution option {0} does not exist")]
    InvalidChoice(usize),
}

pub type EngineResult<T> = Result<T, EngineError>;
