//! Quality and energy scores derived from sleep duration and restlessness.
//!
//! Both scores live in `[0, 100]` and are rounded to one decimal. Inputs are
//! clamped to their domain first (`duration >= 0`, restlessness `1..=5`).

use serde::{Deserialize, Serialize};

use bearly_store::LogRecord;

/// Hours of sleep that earn the full duration component.
pub const IDEAL_SLEEP_HOURS: f64 = 8.0;

/// Quality score: 70 points for duration, 30 for calmness.
///
/// Loses 10 points per hour away from [`IDEAL_SLEEP_HOURS`] and 7.5 points
/// per restlessness step above 1.
pub fn sleep_quality(duration: f64, restlessness: u8) -> f64 {
    let duration = duration.max(0.0);
    let restlessness = clamp_restlessness(restlessness);

    let duration_score = (70.0 - (IDEAL_SLEEP_HOURS - duration).abs() * 10.0).max(0.0);
    let restlessness_score = (30.0 - (restlessness - 1.0) * 7.5).max(0.0);

    round_tenth(duration_score + restlessness_score)
}

/// Energy score: duration saturates at [`IDEAL_SLEEP_HOURS`] for 70 points,
/// calmness contributes up to 30.
pub fn energy_score(duration: f64, restlessness: u8) -> f64 {
    let duration = duration.max(0.0);
    let restlessness = clamp_restlessness(restlessness);

    let duration_component = (duration / IDEAL_SLEEP_HOURS).min(1.0) * 70.0;
    let restlessness_component = ((6.0 - restlessness) / 5.0).max(0.0) * 30.0;

    round_tenth(duration_component + restlessness_component)
}

/// Mean of `score` over `records`, using the default restlessness where one
/// is missing. An empty slice averages to 0.
pub fn average<F>(records: &[LogRecord], score: F) -> f64
where
    F: Fn(f64, u8) -> f64,
{
    if records.is_empty() {
        return 0.0;
    }

    let total: f64 = records
        .iter()
        .map(|r| score(r.duration, r.restlessness_or_default()))
        .sum();
    total / records.len() as f64
}

/// Scores of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordScore {
    pub quality: f64,
    pub energy: f64,
}

impl RecordScore {
    pub fn of(record: &LogRecord) -> Self {
        let restlessness = record.restlessness_or_default();
        Self {
            quality: sleep_quality(record.duration, restlessness),
            energy: energy_score(record.duration, restlessness),
        }
    }
}

/// Aggregate scores over a whole sleep log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub avg_quality: f64,
    pub avg_energy: f64,
    pub avg_duration: f64,
}

impl ScoreSummary {
    pub fn from_records(records: &[LogRecord]) -> Self {
        Self {
            count: records.len(),
            avg_quality: average(records, sleep_quality),
            avg_energy: average(records, energy_score),
            avg_duration: average(records, |duration, _| duration),
        }
    }
}

fn clamp_restlessness(restlessness: u8) -> f64 {
    f64::from(restlessness.clamp(1, 5))
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
