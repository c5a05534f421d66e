use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StorageError;
use crate::types::{LogRecord, SessionState};

/// File name of the sleep log inside the data directory.
pub const LOG_FILE_NAME: &str = "sleep_logs.json";

/// File name of the session state inside the data directory.
pub const SESSION_FILE_NAME: &str = "session_state.json";

/// Default data directory (`~/.local/share/bearly` on Linux).
pub fn default_data_dir() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
    Ok(data_dir.join("bearly"))
}

/// Durable record of whether a session is active. Read and written whole.
pub trait SessionStore {
    /// Load the persisted state, or the idle default if nothing is stored.
    fn load(&self) -> Result<SessionState, StorageError>;

    /// Overwrite the persisted state.
    fn save(&self, state: &SessionState) -> Result<(), StorageError>;

    /// Forget the persisted state entirely.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Ordered collection of completed sessions. Read and written whole.
pub trait LogStore {
    /// Load all records in insertion order, or an empty list if nothing is stored.
    fn load(&self) -> Result<Vec<LogRecord>, StorageError>;

    /// Overwrite the store with the full collection.
    fn save(&self, records: &[LogRecord]) -> Result<(), StorageError>;

    /// Delete the store entirely.
    fn clear(&self) -> Result<(), StorageError>;

    /// Append one record with a full read-modify-write cycle. Not locked.
    fn append(&self, record: LogRecord) -> Result<(), StorageError> {
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)
    }
}

/// Session state persisted as a single JSON object.
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    /// Store at `<data_dir>/session_state.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(SESSION_FILE_NAME))
    }

    /// Store at an explicit file path (useful for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self) -> Result<SessionState, StorageError> {
        let Some(state) = read_json::<SessionState>(&self.path)? else {
            return Ok(SessionState::default());
        };

        if !state.is_consistent() {
            return Err(StorageError::Corrupt {
                path: self.path.clone(),
                reason: "sleep_start_time must be set exactly when is_sleeping is true".into(),
            });
        }

        Ok(state)
    }

    fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        write_json(&self.path, state)
    }

    fn clear(&self) -> Result<(), StorageError> {
        remove_file(&self.path)
    }
}

/// Sleep log persisted as a JSON array.
pub struct JsonLogStore {
    path: PathBuf,
}

impl JsonLogStore {
    /// Store at `<data_dir>/sleep_logs.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(LOG_FILE_NAME))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStore for JsonLogStore {
    fn load(&self) -> Result<Vec<LogRecord>, StorageError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn save(&self, records: &[LogRecord]) -> Result<(), StorageError> {
        write_json(&self.path, &records)
    }

    fn clear(&self) -> Result<(), StorageError> {
        remove_file(&self.path)
    }
}

/// Read and parse a JSON file. `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Serialize `value` as pretty JSON and overwrite `path`, creating parent directories.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "Wrote store file");
    Ok(())
}

fn remove_file(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed store file");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
