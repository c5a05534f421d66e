use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured activity events for sleep tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStarted {
        at: DateTime<Utc>,
    },
    /// `start` while a session was already running
    AlreadySleeping {
        since: DateTime<Utc>,
    },
    SessionEnded {
        duration_hours: f64,
        quality: f64,
        energy: f64,
    },
    /// `end` while no session was running
    NotSleeping,
    SleepLogged {
        duration_hours: f64,
        restlessness: u8,
        quality: f64,
        energy: f64,
    },
    StoresReset,
    TipReady {
        coach: String,
        tip: String,
    },
    TipFailed {
        coach: String,
        error: String,
    },
    /// A store could not be read and defaults were used instead
    StorageRecovered {
        store: String,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for bearly events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger that also appends JSON lines to `log_path`
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let _ = writeln!(file, "{}", event.with_timestamp());
            }
        }

        let line = match self.format {
            LogFormat::Json => serde_json::to_string(event).ok(),
            LogFormat::Pretty => Some(Self::render_pretty(event)),
            LogFormat::Compact => Some(Self::render_compact(event)),
        };

        if let Some(line) = line {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    fn render_pretty(event: &LogEvent) -> String {
        match event {
            LogEvent::SessionStarted { at } => format!(
                "{} {} at {}",
                "☾".bright_blue(),
                "Sleep session started".bold(),
                at.format("%Y-%m-%d %H:%M")
            ),
            LogEvent::AlreadySleeping { since } => format!(
                "{} Already sleeping since {}",
                "⚠".bright_yellow(),
                since.format("%Y-%m-%d %H:%M")
            ),
            LogEvent::SessionEnded {
                duration_hours,
                quality,
                energy,
            } => format!(
                "{} {} {:.2}h slept, quality {:.1}, energy {:.1}",
                "☀".bright_yellow(),
                "Good morning!".bold(),
                duration_hours,
                quality,
                energy
            ),
            LogEvent::NotSleeping => format!(
                "{} No sleep session is running",
                "⚠".bright_yellow()
            ),
            LogEvent::SleepLogged {
                duration_hours,
                restlessness,
                quality,
                energy,
            } => format!(
                "{} Logged {:.1}h (restlessness {}), quality {:.1}, energy {:.1}",
                "✓".bright_green(),
                duration_hours,
                restlessness,
                quality,
                energy
            ),
            LogEvent::StoresReset => format!("{} All sleep data cleared", "✓".bright_green()),
            LogEvent::TipReady { tip, .. } => {
                format!("{} {} {}", "🐻".normal(), "Tip:".bold(), tip)
            }
            LogEvent::TipFailed { coach, error } => format!(
                "{} Coaching tip unavailable ({}): {}",
                "✗".bright_red(),
                coach,
                error.dimmed()
            ),
            LogEvent::StorageRecovered { store, error } => format!(
                "{} Could not read {} store, using defaults: {}",
                "⚠".bright_yellow(),
                store,
                error.dimmed()
            ),
        }
    }

    fn render_compact(event: &LogEvent) -> String {
        let timestamp = Utc::now().format("%H:%M:%S");
        match event {
            LogEvent::SessionStarted { at } => {
                format!("[{}] session:start {}", timestamp, at.to_rfc3339())
            }
            LogEvent::AlreadySleeping { since } => {
                format!("[{}] session:active {}", timestamp, since.to_rfc3339())
            }
            LogEvent::SessionEnded {
                duration_hours,
                quality,
                energy,
            } => format!(
                "[{}] session:end {:.2}h q={:.1} e={:.1}",
                timestamp, duration_hours, quality, energy
            ),
            LogEvent::NotSleeping => format!("[{}] session:idle", timestamp),
            LogEvent::SleepLogged {
                duration_hours,
                restlessness,
                quality,
                energy,
            } => format!(
                "[{}] log:add {:.1}h r={} q={:.1} e={:.1}",
                timestamp, duration_hours, restlessness, quality, energy
            ),
            LogEvent::StoresReset => format!("[{}] store:reset", timestamp),
            LogEvent::TipReady { coach, tip } => {
                format!("[{}] tip:{} {}", timestamp, coach, tip)
            }
            LogEvent::TipFailed { coach, error } => {
                format!("[{}] tip:{}:error {}", timestamp, coach, error)
            }
            LogEvent::StorageRecovered { store, error } => {
                format!("[{}] store:{}:recovered {}", timestamp, store, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LogEvent::SessionEnded {
            duration_hours: 7.5,
            quality: 87.5,
            energy: 89.6,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "session_ended");
        assert_eq!(json["duration_hours"], 7.5);
    }

    #[test]
    fn test_compact_render() {
        let line = Logger::render_compact(&LogEvent::SleepLogged {
            duration_hours: 7.5,
            restlessness: 2,
            quality: 87.5,
            energy: 89.6,
        });

        assert!(line.ends_with("log:add 7.5h r=2 q=87.5 e=89.6"));
    }

    #[test]
    fn test_file_sink_appends_timestamped_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("activity.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        let at = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        logger.log(&LogEvent::SessionStarted { at });
        logger.log(&LogEvent::StoresReset);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "session_started");
        assert_eq!(first["at"], "2026-03-01T23:00:00Z");
        assert!(first["timestamp"].is_string());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "stores_reset");
    }
}
