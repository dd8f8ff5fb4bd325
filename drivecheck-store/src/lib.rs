//! Session persistence, export and aggregate statistics.
//!
//! The engine never reads sessions back. Everything here serves the shell
//! and the review tooling.

use std::path::PathBuf;

use drivecheck_core::SessionId;
use thiserror::Error;

pub mod export;
pub mod repository;
pub mod stats;

pub use export::{ExportFormat, attempts_csv, sessions_json, summary_csv};
pub use repository::{JsonDirRepository, MemoryRepository, SessionRepository};
pub use stats::{AggregateStats, IllusionStats, PerceptionStats, PumpStats};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("invalid session id: {0:?}")]
    InvalidId(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
