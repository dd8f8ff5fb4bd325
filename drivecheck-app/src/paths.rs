use std::path::PathBuf;

use directories::ProjectDirs;

/// Where sessions are kept when `--data-dir` is not given.
pub fn default_session_dir() -> PathBuf {
    ProjectDirs::from("com", "Drivecheck", "Drivecheck")
        .map(|dirs| dirs.data_dir().join("sessions"))
        .unwrap_or_else(|| PathBuf::from("drivecheck-sessions"))
}
