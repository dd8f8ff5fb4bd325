use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use drivecheck_core::{Session, SessionId, TrialResult};
use log::{debug, warn};

use crate::{StoreError, StoreResult};

const FILE_PREFIX: &str = "session_";
const FILE_SUFFIX: &str = ".json";

/// Storage for candidate sessions.
///
/// Implementations only ever add results to a stored session; nothing here
/// rewrites a recorded trial.
pub trait SessionRepository {
    /// Inserts or replaces the whole session record.
    fn save(&mut self, session: &Session) -> StoreResult<()>;

    fn load(&self, id: &SessionId) -> StoreResult<Session>;

    /// All stored sessions, oldest first.
    fn list_sessions(&self) -> StoreResult<Vec<Session>>;

    /// Returns whether a session was removed.
    fn delete(&mut self, id: &SessionId) -> StoreResult<bool>;

    /// Removes every session and returns how many there were.
    fn clear(&mut self) -> StoreResult<usize>;

    /// Loads the session, appends one result and writes it back.
    fn append(&mut self, id: &SessionId, result: TrialResult) -> StoreResult<Session> {
        let mut session = self.load(id)?;
        session.append(result);
        self.save(&session)?;
        Ok(session)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    sessions: BTreeMap<SessionId, Session>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionRepository for MemoryRepository {
    fn save(&mut self, session: &Session) -> StoreResult<()> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> StoreResult<Session> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    fn delete(&mut self, id: &SessionId) -> StoreResult<bool> {
        Ok(self.sessions.remove(id).is_some())
    }

    fn clear(&mut self) -> StoreResult<usize> {
        let count = self.sessions.len();
        self.sessions.clear();
        Ok(count)
    }
}

/// One pretty-printed JSON file per session, named `session_<id>.json`.
///
/// Files in the directory that do not follow the naming scheme are left
/// alone. A file that matches but fails to parse is skipped with a warning
/// when listing, and reported as an error when loaded directly.
#[derive(Debug, Clone)]
pub struct JsonDirRepository {
    dir: PathBuf,
}

impl JsonDirRepository {
    /// Opens the directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;
        debug!("session store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &SessionId) -> StoreResult<PathBuf> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(raw.to_string()));
        }
        Ok(self.dir.join(format!("{FILE_PREFIX}{raw}{FILE_SUFFIX}")))
    }

    fn session_files(&self) -> StoreResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| io_error(&self.dir, source))?;
            let path = entry.path();
            let is_session = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX));
            if is_session && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn read(path: &Path) -> StoreResult<Session> {
        let contents = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl SessionRepository for JsonDirRepository {
    fn save(&mut self, session: &Session) -> StoreResult<()> {
        let path = self.path_for(&session.id)?;
        let json = serde_json::to_string_pretty(session)?;

        // Write beside the target and rename so a crash never leaves half a file.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(|source| io_error(&staging, source))?;
        fs::rename(&staging, &path).map_err(|source| io_error(&path, source))?;
        debug!(
            "saved session {} ({} trials)",
            session.id,
            session.trial_count()
        );
        Ok(())
    }

    fn load(&self, id: &SessionId) -> StoreResult<Session> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(id.clone()));
        }
        Self::read(&path)
    }

    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let mut sessions = Vec::new();
        for path in self.session_files()? {
            match Self::read(&path) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    fn delete(&mut self, id: &SessionId) -> StoreResult<bool> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(io_error(&path, source)),
        }
    }

    fn clear(&mut self) -> StoreResult<usize> {
        let files = self.session_files()?;
        for path in &files {
            fs::remove_file(path).map_err(|source| io_error(path, source))?;
        }
        Ok(files.len())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivecheck_core::{
        ClientInfo, Participant, PerceptionOutcome, PerceptionResult, PerceptionTermination,
        PumpOutcome, PumpResult,
    };

    fn session(name: &str) -> Session {
        Session::new(
            Participant {
                name: name.into(),
                application_number: "77".into(),
            },
            ClientInfo::capture(),
        )
    }

    fn perception() -> TrialResult {
        TrialResult::Perception(PerceptionResult {
            outcome: PerceptionOutcome::Success,
            termination: PerceptionTermination::Stopped,
            visible_ms: 4000,
            hidden_ms: 2000,
            speed_px_per_s: 100.0,
            started_at_ms: 0.0,
            hide_at_ms: Some(4000.0),
            stop_at_ms: Some(5000.0),
            collision_at_ms: None,
            position_at_stop: 540.0,
            distance_to_obstacle: 100.0,
            reaction_latency_ms: Some(1000.0),
        })
    }

    fn pump(points: u32) -> TrialResult {
        TrialResult::FuelPump(PumpResult {
            outcome: PumpOutcome::Stopped,
            pumps: points,
            points,
            elapsed_ms: 800.0,
            blast_ms: 3000,
            started_at_ms: Some(0.0),
            ended_at_ms: 800.0,
        })
    }

    fn exercise(repo: &mut impl SessionRepository) {
        let first = session("Ada");
        let mut second = session("Grace");
        second.created_at = first.created_at + chrono::Duration::seconds(1);
        repo.save(&first).unwrap();
        repo.save(&second).unwrap();

        repo.append(&first.id, perception()).unwrap();
        let updated = repo.append(&first.id, pump(5)).unwrap();
        assert_eq!(updated.banked_points, 5);

        let loaded = repo.load(&first.id).unwrap();
        assert_eq!(loaded.perception.len(), 1);
        assert_eq!(loaded.fuel_pump.len(), 1);
        assert_eq!(loaded.banked_points, 5);

        let listed = repo.list_sessions().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].participant.name, "Ada");

        assert!(repo.delete(&second.id).unwrap());
        assert!(!repo.delete(&second.id).unwrap());
        assert!(matches!(repo.load(&second.id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            repo.append(&second.id, perception()),
            Err(StoreError::NotFound(_))
        ));

        assert_eq!(repo.clear().unwrap(), 1);
        assert!(repo.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn memory_repository_round_trip() {
        let mut repo = MemoryRepository::new();
        exercise(&mut repo);
        assert!(repo.is_empty());
    }

    #[test]
    fn json_dir_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = JsonDirRepository::open(dir.path().join("sessions")).unwrap();
        exercise(&mut repo);
    }

    #[test]
    fn json_dir_ignores_foreign_files_and_skips_corrupt_ones() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = JsonDirRepository::open(dir.path()).unwrap();
        let kept = session("Ada");
        repo.save(&kept).unwrap();

        fs::write(dir.path().join("notes.txt"), "not a session").unwrap();
        fs::write(dir.path().join("session_broken.json"), "{ nope").unwrap();

        let listed = repo.list_sessions().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
        assert!(matches!(
            repo.load(&SessionId::from("broken")),
            Err(StoreError::Serialization(_))
        ));

        assert_eq!(repo.clear().unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn path_traversal_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirRepository::open(dir.path()).unwrap();
        for bad in ["../escape", "", "a/b", "x.json"] {
            assert!(matches!(
                repo.path_for(&SessionId::from(bad)),
                Err(StoreError::InvalidId(_))
            ));
        }
        let path = repo.path_for(&SessionId::from("abc-123")).unwrap();
        assert_eq!(path, dir.path().join("session_abc-123.json"));
    }
}
