use thiserror::Error;

/// Caller-side configuration mistakes. These are raised at trial start and
/// never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name}: min {min} ms exceeds max {max} ms")]
    InvalidBounds {
        name: &'static str,
        min: u64,
        max: u64,
    },

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("visible_ms {visible_ms} plus hidden_ms {hidden_ms} overflows")]
    DurationOverflow { visible_ms: u64, hidden_ms: u64 },

    #[error("lane geometry leaves no room to travel: {0}")]
    Geometry(String),

    #[error("unknown scenario {0}")]
    UnknownScenario(u32),

    #[error("outcome table has no entry for scenario {scenario}, mode {mode}, action {action}")]
    MissingOutcome {
        scenario: u32,
        mode: &'static str,
        action: &'static str,
    },

    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}
