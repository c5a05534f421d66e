//! Sleep tracking core for bearly.
//!
//! - [`SessionController`] drives the idle/sleeping lifecycle over the stores
//! - [`sleep_quality`] and [`energy_score`] score a single night
//! - [`summarize`] reports over the whole log
//! - [`Coach`] implementations turn the latest night into a tip

mod coach;
mod controller;
mod encourage;
mod error;
mod scoring;
mod sensors;
mod summary;

pub use coach::{Coach, CoachError, CommandCoach, RuleCoach, TipRequest};
pub use controller::{
    validate_entry, EndOutcome, RecoveryCallback, SessionController, StartOutcome,
    PLACEHOLDER_RESTLESSNESS,
};
pub use encourage::{pick_uplifting_message, UPLIFTING_MESSAGES};
pub use error::{SessionError, SummaryError, ValidationError};
pub use scoring::{
    average, energy_score, sleep_quality, RecordScore, ScoreSummary, IDEAL_SLEEP_HOURS,
};
pub use sensors::{PlaceholderSensors, SensorReadings, SensorSource};
pub use summary::{
    summarize, summary_text, SleepSummary, TemperatureRange, MINUTES_PER_RECORD,
    NOISY_SOUND_LEVEL, PHASE_BREAKDOWN,
};
