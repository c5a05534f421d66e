use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Restlessness assumed for records that never recorded one.
pub const DEFAULT_RESTLESSNESS: u8 = 2;

/// One completed sleep session, as persisted in the log store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the session ended (or when the night was logged by hand).
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub date: DateTime<Utc>,
    /// Hours slept.
    pub duration: f64,
    /// 1 (calm) to 5 (very restless).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restlessness: Option<u8>,
    #[serde(default)]
    pub phases: Vec<String>,
    #[serde(default)]
    pub noise: f64,
    /// Absent on nights logged without readings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub movement: f64,
    #[serde(default)]
    pub shock: bool,
    #[serde(default)]
    pub sound: f64,
}

impl LogRecord {
    /// Restlessness with the default applied for records that lack one.
    pub fn restlessness_or_default(&self) -> u8 {
        self.restlessness.unwrap_or(DEFAULT_RESTLESSNESS)
    }
}

/// Whether a sleep session is in progress, and since when.
///
/// The on-disk shape is `{"is_sleeping": bool, "sleep_start_time": string|null}`.
/// `sleep_start_time` is set if and only if `is_sleeping` is true; use the
/// constructors to keep it that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub is_sleeping: bool,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub sleep_start_time: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn sleeping(since: DateTime<Utc>) -> Self {
        Self {
            is_sleeping: true,
            sleep_start_time: Some(since),
        }
    }

    /// Start time of the active session, if any.
    pub fn sleeping_since(&self) -> Option<DateTime<Utc>> {
        if self.is_sleeping {
            self.sleep_start_time
        } else {
            None
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.is_sleeping == self.sleep_start_time.is_some()
    }
}
