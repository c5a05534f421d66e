use std::sync::Mutex;

use crate::error::StorageError;
use crate::store::{LogStore, SessionStore};
use crate::types::{LogRecord, SessionState};

/// Session store held in memory. Nothing touches the filesystem.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Mutex<Option<SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already persisted state.
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionState, StorageError> {
        let guard = self.state.lock().expect("Session store lock poisoned");
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let mut guard = self.state.lock().expect("Session store lock poisoned");
        *guard = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.state.lock().expect("Session store lock poisoned");
        *guard = None;
        Ok(())
    }
}

/// Log store held in memory.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<LogRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl LogStore for MemoryLogStore {
    fn load(&self) -> Result<Vec<LogRecord>, StorageError> {
        Ok(self.records.lock().expect("Log store lock poisoned").clone())
    }

    fn save(&self, records: &[LogRecord]) -> Result<(), StorageError> {
        *self.records.lock().expect("Log store lock poisoned") = records.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.records.lock().expect("Log store lock poisoned").clear();
        Ok(())
    }
}
