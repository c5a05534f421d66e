//! Statistical report over the raw readings of a sleep log.

use std::fmt;

use serde::{Deserialize, Serialize};

use bearly_store::LogRecord;

use crate::error::SummaryError;

/// Minutes reported per record.
///
/// Suspect: readings are nominally taken every 5 minutes, which would make
/// this 5 (or 60 / 5 = 12 records per hour, not minutes per record). Kept
/// as-is so reports match the existing numbers.
pub const MINUTES_PER_RECORD: usize = 12;

/// A reading at or above this sound level counts as noisy.
pub const NOISY_SOUND_LEVEL: f64 = 560.0;

/// Fixed phase split reported for every log. Not derived from the readings.
pub const PHASE_BREAKDOWN: [(&str, u8); 4] = [("light", 50), ("deep", 30), ("rem", 15), ("awake", 5)];

/// Aggregates over a non-empty set of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub records: usize,
    /// `records * MINUTES_PER_RECORD`; see the note on that constant.
    pub duration_minutes: usize,
    /// Fraction of readings at or above [`NOISY_SOUND_LEVEL`], in `[0, 1]`.
    pub noise_score: f64,
    /// Over the records that carry a temperature; `None` if none do.
    pub temperature: Option<TemperatureRange>,
    /// Percentage of readings with a shock event.
    pub shock_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl TemperatureRange {
    fn from_readings(readings: &[f64]) -> Option<Self> {
        if readings.is_empty() {
            return None;
        }
        Some(Self {
            avg: readings.iter().sum::<f64>() / readings.len() as f64,
            min: readings.iter().copied().fold(f64::INFINITY, f64::min),
            max: readings.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Summarize `records`. Fails on an empty slice.
pub fn summarize(records: &[LogRecord]) -> Result<SleepSummary, SummaryError> {
    if records.is_empty() {
        return Err(SummaryError::Empty);
    }

    let count = records.len() as f64;

    let noisy = records.iter().filter(|r| r.sound >= NOISY_SOUND_LEVEL).count();
    let shocks = records.iter().filter(|r| r.shock).count();

    let temperatures: Vec<f64> = records.iter().filter_map(|r| r.temperature).collect();

    Ok(SleepSummary {
        records: records.len(),
        duration_minutes: records.len() * MINUTES_PER_RECORD,
        noise_score: noisy as f64 / count,
        temperature: TemperatureRange::from_readings(&temperatures),
        shock_percent: shocks as f64 / count * 100.0,
    })
}

/// Summarize `records` straight to the text report.
pub fn summary_text(records: &[LogRecord]) -> Result<String, SummaryError> {
    summarize(records).map(|summary| summary.to_string())
}

impl fmt::Display for SleepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sleep summary ({} records)", self.records)?;
        writeln!(f, "- Tracked time: {} minutes", self.duration_minutes)?;
        writeln!(f, "- Noise score: {:.2}", self.noise_score)?;
        let phases: Vec<String> = PHASE_BREAKDOWN
            .iter()
            .map(|(name, pct)| format!("{} {}%", name, pct))
            .collect();
        writeln!(f, "- Sleep phases (fixed estimate): {}", phases.join(", "))?;
        match self.temperature {
            Some(t) => writeln!(
                f,
                "- Temperature: avg {:.1}°C, min {:.1}°C, max {:.1}°C",
                t.avg, t.min, t.max
            )?,
            None => writeln!(f, "- Temperature: no readings")?,
        }
        write!(f, "- Shock events: {:.1}% of records", self.shock_percent)
    }
}
