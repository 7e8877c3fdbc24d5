//! Errors reported by the tide engine core.
//!
//! None of these are fatal. Each one means "no data for this question" and the
//! caller is expected to fall back (see [`crate::fallback::or_synthetic`]).

use chrono::NaiveDate;
use thiserror::Error;

/// Why the core could not produce tide data for a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TideError {
    /// No bulletin line matches the requested date
    #[error("no bulletin record for {month}/{day}")]
    NotFound { month: u32, day: u32 },

    /// A line matched the date but has no station code after it
    #[error("malformed bulletin record: {line:?}")]
    MalformedRecord { line: String },

    /// The record was found but no tide event could be decoded from it
    #[error("no tide events decoded for {date}")]
    EmptyDay { date: NaiveDate },

    /// Interpolation needs at least two events
    #[error("need at least 2 tide events, got {count}")]
    InsufficientEvents { count: usize },
}

impl TideError {
    /// True for the errors that mean the bulletin has nothing usable for a
    /// day. `MalformedRecord` is treated exactly like `NotFound`.
    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            TideError::NotFound { .. } | TideError::MalformedRecord { .. } | TideError::EmptyDay { .. }
        )
    }
}
