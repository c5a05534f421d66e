use chrono::{DateTime, Utc};
use thiserror::Error;

use bearly_store::StorageError;

/// Input rejected before any state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Sleep duration must be greater than zero hours (got {0})")]
    NonPositiveDuration(f64),

    #[error("Session ends at {end} before it started at {start}")]
    NegativeDuration {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Restlessness must be between 1 and 5 (got {0})")]
    RestlessnessOutOfRange(u8),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("Cannot summarize an empty sleep log")]
    Empty,
}
