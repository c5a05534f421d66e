use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bearly_store::{LogRecord, LogStore, SessionState, SessionStore, StorageError};

use crate::error::{SessionError, ValidationError};
use crate::sensors::SensorSource;

/// Restlessness recorded for tracked sessions; nothing measures it yet.
pub const PLACEHOLDER_RESTLESSNESS: u8 = 2;

/// Called when a store could not be read and its default was used instead.
/// Receives the store name (`"session"` or `"log"`) and the read error.
pub type RecoveryCallback = Arc<dyn Fn(&str, &StorageError) + Send + Sync>;

/// Result of [`SessionController::start_at`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { at: DateTime<Utc> },
    /// A session was already running; nothing changed
    AlreadySleeping { since: DateTime<Utc> },
}

/// Result of [`SessionController::end_at`]
#[derive(Debug, Clone, PartialEq)]
pub enum EndOutcome {
    Ended(LogRecord),
    /// No session was running; nothing changed
    NotSleeping,
}

/// Drives the idle/sleeping lifecycle over a session store and a log store.
pub struct SessionController<'a> {
    sessions: &'a dyn SessionStore,
    logs: &'a dyn LogStore,
    sensors: &'a dyn SensorSource,
    on_recover: Option<RecoveryCallback>,
}

impl<'a> SessionController<'a> {
    pub fn new(
        sessions: &'a dyn SessionStore,
        logs: &'a dyn LogStore,
        sensors: &'a dyn SensorSource,
    ) -> Self {
        Self {
            sessions,
            logs,
            sensors,
            on_recover: None,
        }
    }

    pub fn with_recovery_callback(mut self, callback: RecoveryCallback) -> Self {
        self.on_recover = Some(callback);
        self
    }

    /// Current session state. An unreadable store counts as idle.
    pub fn status(&self) -> SessionState {
        self.sessions.load().unwrap_or_else(|e| {
            self.recovered("session", &e);
            SessionState::default()
        })
    }

    /// All logged nights in chronological order. An unreadable store counts as empty.
    pub fn history(&self) -> Vec<LogRecord> {
        self.logs.load().unwrap_or_else(|e| {
            self.recovered("log", &e);
            Vec::new()
        })
    }

    pub fn start(&self) -> Result<StartOutcome, SessionError> {
        self.start_at(Utc::now())
    }

    /// Begin a session at `now`. A no-op while already sleeping.
    pub fn start_at(&self, now: DateTime<Utc>) -> Result<StartOutcome, SessionError> {
        if let Some(since) = self.status().sleeping_since() {
            debug!(%since, "Start ignored, session already active");
            return Ok(StartOutcome::AlreadySleeping { since });
        }

        self.sessions.save(&SessionState::sleeping(now))?;
        info!(at = %now, "Sleep session started");
        Ok(StartOutcome::Started { at: now })
    }

    pub fn end(&self) -> Result<EndOutcome, SessionError> {
        self.end_at(Utc::now())
    }

    /// End the running session at `now`, log it and go back to idle.
    /// A no-op while idle.
    ///
    /// The log append and the session reset are two separate writes; a
    /// failure between them leaves the night logged but the session active.
    pub fn end_at(&self, now: DateTime<Utc>) -> Result<EndOutcome, SessionError> {
        let Some(since) = self.status().sleeping_since() else {
            debug!("End ignored, no active session");
            return Ok(EndOutcome::NotSleeping);
        };

        if now < since {
            return Err(ValidationError::NegativeDuration {
                start: since,
                end: now,
            }
            .into());
        }

        let duration = hours_between(since, now);
        let record = self
            .sensors
            .read()
            .into_record(now, duration, Some(PLACEHOLDER_RESTLESSNESS));

        self.logs.append(record.clone())?;
        self.sessions.save(&SessionState::idle())?;

        info!(duration_hours = duration, "Sleep session ended");
        Ok(EndOutcome::Ended(record))
    }

    pub fn log_manual(&self, duration: f64, restlessness: u8) -> Result<LogRecord, SessionError> {
        self.log_manual_at(Utc::now(), duration, restlessness)
    }

    /// Log a night entered by hand. Rejects invalid input before writing anything.
    pub fn log_manual_at(
        &self,
        now: DateTime<Utc>,
        duration: f64,
        restlessness: u8,
    ) -> Result<LogRecord, SessionError> {
        validate_entry(duration, restlessness)?;

        let record = self
            .sensors
            .read()
            .into_record(now, duration, Some(restlessness));
        self.logs.append(record.clone())?;

        info!(duration_hours = duration, restlessness, "Sleep logged");
        Ok(record)
    }

    /// Delete both stores, from either state.
    pub fn reset(&self) -> Result<(), SessionError> {
        let logs = self.logs.clear();
        let sessions = self.sessions.clear();
        logs?;
        sessions?;

        info!("Sleep data reset");
        Ok(())
    }

    fn recovered(&self, store: &str, error: &StorageError) {
        warn!(store, error = %error, "Store unreadable, using defaults");
        if let Some(ref callback) = self.on_recover {
            callback(store, error);
        }
    }
}

/// Check a hand-entered night: positive finite duration, restlessness 1 to 5.
pub fn validate_entry(duration: f64, restlessness: u8) -> Result<(), ValidationError> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ValidationError::NonPositiveDuration(duration));
    }
    if !(1..=5).contains(&restlessness) {
        return Err(ValidationError::RestlessnessOutOfRange(restlessness));
    }
    Ok(())
}

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}
