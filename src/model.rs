//! # Tide Level Model
//!
//! Point-in-time queries against one day's tide events.
//!
//! ## Interpolation
//!
//! Between two consecutive events the level follows a raised cosine:
//!
//! ```text
//! level = prev + (next - prev) * (1 - cos(progress * π)) / 2
//! ```
//!
//! where `progress` runs from 0 at `prev` to 1 at `next`. The curve is flat at
//! each extreme and steepest half way, which is how real tides turn. Both
//! endpoints are reproduced exactly.
//!
//! ## Midnight
//!
//! A day's event list is treated as cyclic: a query before the first event (or
//! after the last) is bracketed by the last event and the first one, with the
//! interval running through 24:00. All minute differences wrap modulo 1440.
//!
//! Nothing here reads the clock; `now` is always passed in.

use crate::{
    minute_of_day, DayTides, Sample, TideError, TideEvent, TideKind, TideSample, TideSeries,
    TimeUntil, MINUTES_PER_DAY,
};
use chrono::NaiveTime;
use std::f64::consts::PI;

/// Default spacing of [`daily_curve`] samples: 145 points over the day.
pub const DEFAULT_CURVE_STEP_MINUTES: u16 = 10;

/// Events sorted by time of day, or `InsufficientEvents` if there are < 2.
fn sorted_events(events: &[TideEvent]) -> Result<Vec<TideEvent>, TideError> {
    if events.len() < 2 {
        return Err(TideError::InsufficientEvents {
            count: events.len(),
        });
    }
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|event| event.time);
    Ok(sorted)
}

/// Forward distance in minutes from `from` to `to`, in `0..1440`.
fn minutes_forward(from: i32, to: i32) -> i32 {
    (to - from).rem_euclid(MINUTES_PER_DAY)
}

/// Indices `(prev, next)` with `prev.time <= minute < next.time`, cyclic.
fn bracket_from(sorted: &[TideEvent], minute: i32) -> (usize, usize) {
    let prev = sorted
        .iter()
        .rposition(|event| event.minute_of_day() <= minute)
        .unwrap_or(sorted.len() - 1);
    (prev, (prev + 1) % sorted.len())
}

/// Index of the first event at or after `minute`, wrapping to the first
/// event of the day. An event is still "next" at its own timestamp.
fn next_index(sorted: &[TideEvent], minute: i32) -> usize {
    sorted
        .iter()
        .position(|event| event.minute_of_day() >= minute)
        .unwrap_or(0)
}

fn raised_cosine(prev: &TideEvent, next: &TideEvent, minute: i32) -> f64 {
    let elapsed = minutes_forward(prev.minute_of_day(), minute);
    let total = minutes_forward(prev.minute_of_day(), next.minute_of_day());
    let from = f64::from(prev.level_cm);

    // Two events at the same minute.
    if total == 0 {
        return from;
    }

    let progress = f64::from(elapsed) / f64::from(total);
    let to = f64::from(next.level_cm);
    from + (to - from) * (1.0 - (progress * PI).cos()) / 2.0
}

fn level_in_sorted(sorted: &[TideEvent], minute: i32) -> f64 {
    let (prev, next) = bracket_from(sorted, minute);
    raised_cosine(&sorted[prev], &sorted[next], minute)
}

/// Tide level in centimetres at `minute` minutes after midnight.
///
/// `minute` is taken modulo 1440, so 1440 is midnight again.
///
/// # Errors
/// [`TideError::InsufficientEvents`] when fewer than two events are given.
///
/// # Example
/// ```
/// use chrono::NaiveTime;
/// use tide_engine_lib::model::interpolate_level;
/// use tide_engine_lib::TideEvent;
///
/// let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
/// let events = [TideEvent::new(at(6), 180), TideEvent::new(at(12), 50)];
///
/// assert_eq!(interpolate_level(&events, 6 * 60).unwrap(), 180.0);
/// assert_eq!(interpolate_level(&events, 12 * 60).unwrap(), 50.0);
/// let midway = interpolate_level(&events, 9 * 60).unwrap();
/// assert!((midway - 115.0).abs() < 1e-9);
/// ```
pub fn interpolate_level(events: &[TideEvent], minute: i32) -> Result<f64, TideError> {
    let sorted = sorted_events(events)?;
    Ok(level_in_sorted(&sorted, minute.rem_euclid(MINUTES_PER_DAY)))
}

/// Level, trend and countdown to the next extreme at wall-clock `now`.
///
/// The next event is the first one at or after `now`, wrapping to the first
/// event of the list after the last one has passed. At an event's exact minute
/// that event is still next, with a countdown of `0時間0分`.
///
/// # Errors
/// [`TideError::InsufficientEvents`] when fewer than two events are given.
pub fn current_state(events: &[TideEvent], now: NaiveTime) -> Result<TideSample, TideError> {
    let sorted = sorted_events(events)?;
    let minute = minute_of_day(now);

    let next_event = sorted[next_index(&sorted, minute)];
    let wait = minutes_forward(minute, next_event.minute_of_day());

    Ok(TideSample {
        level_cm: level_in_sorted(&sorted, minute),
        is_rising: next_event.kind == TideKind::High,
        next_event,
        time_until_next: TimeUntil::from_minutes(wait as u32),
    })
}

/// The next event of `kind` at or after `now`, with its countdown.
///
/// Works on any number of events; returns `None` when the day has no event of
/// that kind.
pub fn next_of_kind(
    events: &[TideEvent],
    now: NaiveTime,
    kind: TideKind,
) -> Option<(TideEvent, TimeUntil)> {
    let minute = minute_of_day(now);
    events
        .iter()
        .filter(|event| event.kind == kind)
        .map(|event| (*event, minutes_forward(minute, event.minute_of_day())))
        .min_by_key(|(_, wait)| *wait)
        .map(|(event, wait)| (event, TimeUntil::from_minutes(wait as u32)))
}

/// Sample a whole day's curve every `step_minutes`, from 00:00 to 24:00
/// inclusive.
///
/// The series inherits the day's offline flag.
///
/// # Errors
/// [`TideError::InsufficientEvents`] when the day has fewer than two events.
pub fn daily_curve(day: &DayTides, step_minutes: u16) -> Result<TideSeries, TideError> {
    let sorted = sorted_events(&day.events)?;
    let step = usize::from(step_minutes.max(1));

    let samples: Vec<Sample> = (0..=MINUTES_PER_DAY)
        .step_by(step)
        .map(|minute| Sample {
            minute_of_day: minute as u16,
            level_cm: level_in_sorted(&sorted, minute % MINUTES_PER_DAY) as f32,
        })
        .collect();

    Ok(TideSeries {
        samples,
        offline: day.offline,
    })
}
