//! # Tide Engine Core Library
//!
//! This library holds the tidal data engine behind the boat operations
//! dashboard: it turns one year of a fixed-format government tide bulletin
//! into per-day tide events and answers "what is the tide doing right now"
//! questions against them.
//!
//! ## Design Philosophy
//!
//! ### Pure Core
//! - **No I/O**: [`lookup`], [`bulletin`] and [`model`] only read the text and
//!   values they are handed
//! - **Explicit clock**: every query takes `now` as a parameter, nothing in the
//!   core reads the system clock
//! - **Explicit absence**: a missing day, a malformed record, an empty day and a
//!   day with too few events are all reported through [`TideError`] so the
//!   caller can substitute [`fallback`] data instead of seeing invented values
//!
//! ### Data Flow
//! 1. **Fetch**: [`source::BulletinStore`] returns the year's bulletin text,
//!    cached under a caller-chosen TTL
//! 2. **Lookup**: [`lookup::find_day_record`] finds the line for a date
//! 3. **Decode**: [`bulletin::decode_digit_stream`] turns the digit stream into
//!    [`TideEvent`]s
//! 4. **Model**: [`model::current_state`] and friends interpolate between them
//!
//! ## Core Types
//!
//! - [`TideEvent`]: one high or low tide (time of day, height, kind)
//! - [`DayRecord`]: the raw record found for one date
//! - [`TideSample`]: tide state at a query instant
//! - [`DayTides`]: a day's events plus an offline flag
//! - [`Sample`] / [`TideSeries`]: a sampled daily curve for display

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod bulletin;
pub mod config;
pub mod error;
pub mod fallback;
pub mod lookup;
pub mod lunar;
pub mod model;
pub mod renderer;
pub mod source;

pub use error::TideError;

/// Minutes in one day; all time-of-day arithmetic wraps at this value.
pub const MINUTES_PER_DAY: i32 = 1440;

/// Heights at or above this value are high tides.
pub const HIGH_TIDE_THRESHOLD_CM: i32 = 100;

/// Whether a tide event is a high or a low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
}

impl TideKind {
    /// Classify a height. Height is the only discriminant.
    pub fn from_level(level_cm: i32) -> Self {
        if level_cm >= HIGH_TIDE_THRESHOLD_CM {
            TideKind::High
        } else {
            TideKind::Low
        }
    }
}

impl fmt::Display for TideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideKind::High => f.write_str("High"),
            TideKind::Low => f.write_str("Low"),
        }
    }
}

/// A single high or low tide on some day.
///
/// Events carry no date: a day's list is interpreted as wall-clock times of
/// that day, and the model treats the list as repeating across midnight.
///
/// # Example
/// ```
/// use chrono::NaiveTime;
/// use tide_engine_lib::{TideEvent, TideKind};
///
/// let event = TideEvent::new(NaiveTime::from_hms_opt(5, 7, 0).unwrap(), 162);
/// assert_eq!(event.kind, TideKind::High);
/// assert_eq!(event.minute_of_day(), 307);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TideEvent {
    /// Wall-clock time of day
    pub time: NaiveTime,
    /// Height in centimetres above chart datum
    pub level_cm: i32,
    /// High or low, derived from `level_cm`
    pub kind: TideKind,
}

impl TideEvent {
    /// Build an event, classifying it by height.
    pub fn new(time: NaiveTime, level_cm: i32) -> Self {
        Self {
            time,
            level_cm,
            kind: TideKind::from_level(level_cm),
        }
    }

    /// Minutes since midnight (0..1440).
    pub fn minute_of_day(&self) -> i32 {
        minute_of_day(self.time)
    }
}

impl fmt::Display for TideEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.time.format("%H:%M"),
            self.level_cm,
            self.kind
        )
    }
}

/// Minutes since midnight for a wall-clock time, ignoring seconds.
pub fn minute_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// The record found for one date inside a bulletin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayRecord {
    /// Two-digit year as printed in the bulletin
    pub year: u8,
    pub month: u8,
    pub day: u8,
    /// Two-character station code that ends the date fields
    pub station: String,
    /// Everything after the station code, whitespace removed
    pub raw_digit_stream: String,
}

/// Whole hours and minutes until some clock time, counted forward.
///
/// Displays in the dashboard's `{hours}時間{minutes}分` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeUntil {
    pub hours: u32,
    pub minutes: u32,
}

impl TimeUntil {
    pub fn from_minutes(total: u32) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

impl fmt::Display for TimeUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}時間{}分", self.hours, self.minutes)
    }
}

/// Tide state at a query instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideSample {
    /// Interpolated level in centimetres
    pub level_cm: f64,
    /// True iff the next event is a high tide
    pub is_rising: bool,
    /// The event being approached
    pub next_event: TideEvent,
    /// Forward countdown to `next_event`
    pub time_until_next: TimeUntil,
}

/// One day's tide events together with where they came from.
///
/// # Offline Behavior
/// When `offline = true` the events were synthesised by
/// [`fallback::approximate_day`] because the bulletin had nothing usable for
/// this date. Displays should flag such days.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayTides {
    pub date: NaiveDate,
    pub events: Vec<TideEvent>,
    pub offline: bool,
}

/// A point on a sampled daily tide curve.
///
/// - `u16` minute of day (0..=1440, the last sample closes the day)
/// - `f32` level, plenty for centimetre heights
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Sample {
    /// Minutes since midnight
    pub minute_of_day: u16,
    /// Tide level in centimetres
    pub level_cm: f32,
}

/// A whole day's sampled curve with the same offline flag as [`DayTides`].
///
/// # Example
/// ```
/// use tide_engine_lib::{Sample, TideSeries};
///
/// let series = TideSeries {
///     samples: vec![
///         Sample { minute_of_day: 0, level_cm: 80.0 },
///         Sample { minute_of_day: 10, level_cm: 82.5 },
///     ],
///     offline: false,
/// };
///
/// assert_eq!(series.samples.len(), 2);
/// assert!(!series.offline);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TideSeries {
    pub samples: Vec<Sample>,
    pub offline: bool,
}
