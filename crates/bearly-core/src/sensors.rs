use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bearly_store::LogRecord;

/// Sensor values attached to a log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub phases: Vec<String>,
    pub noise: f64,
    pub temperature: f64,
    pub movement: f64,
    pub shock: bool,
    pub sound: f64,
}

impl SensorReadings {
    /// Build the log record for a night with these readings.
    pub fn into_record(
        self,
        date: DateTime<Utc>,
        duration: f64,
        restlessness: Option<u8>,
    ) -> LogRecord {
        LogRecord {
            date,
            duration,
            restlessness,
            phases: self.phases,
            noise: self.noise,
            temperature: Some(self.temperature),
            movement: self.movement,
            shock: self.shock,
            sound: self.sound,
        }
    }
}

/// Where the readings for a new record come from.
pub trait SensorSource {
    fn read(&self) -> SensorReadings;
}

/// Fixed stand-in values; there is no sensor hardware behind bearly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderSensors;

impl SensorSource for PlaceholderSensors {
    fn read(&self) -> SensorReadings {
        SensorReadings {
            phases: ["light", "deep", "rem", "awake"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            noise: 35.0,
            temperature: 21.0,
            movement: 0.0,
            shock: false,
            sound: 500.0,
        }
    }
}
