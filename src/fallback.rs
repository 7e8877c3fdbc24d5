//! # Fallback Tide Day
//!
//! When the bulletin has nothing usable for a date (not found, malformed,
//! empty) the dashboard still needs something to draw. This module synthesises
//! a plausible day of highs and lows and marks it `offline`.
//!
//! ## Model Characteristics
//!
//! - **Semidiurnal**: a single M2 constituent with a 12.42 h period, so a day
//!   gets two highs and two lows (occasionally one of each drops off the end)
//! - **Phase**: tied to the absolute date, so consecutive days line up
//! - **Spring–neap**: amplitude grows towards new/full moon using
//!   [`crate::lunar::schaefer_phase`]
//! - **Classification-safe**: highs always land above 100 cm and lows below
//!
//! This is not a prediction. It only exists so callers never have to invent
//! numbers themselves, and the offline flag tells the display to say so.

use crate::lunar::schaefer_phase;
use crate::{DayTides, TideError, TideEvent};
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::f64::consts::{FRAC_PI_2, TAU};
use tracing::warn;

/// Lunar M2 period in minutes
const M2_PERIOD_MINUTES: f64 = 12.42 * 60.0;

/// High-water interval (Moon transit → local HW) ≈ 3 h 35 m
const LUNITIDAL_OFFSET_MINUTES: f64 = 3.59 * 60.0;

/// Mean level above chart datum
const MEAN_LEVEL_CM: f64 = 120.0;

/// M2 amplitude at mean spring–neap
const M2_AMPLITUDE_CM: f64 = 70.0;

/// Fraction by which the amplitude swings between springs and neaps
const SPRING_NEAP_SWING: f64 = 0.2;

/// Synthesise the highs and lows for `date`.
///
/// The result always has at least two events (one of each kind) and is marked
/// `offline`.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_engine_lib::fallback::approximate_day;
///
/// let day = approximate_day(NaiveDate::from_ymd_opt(2025, 7, 24).unwrap());
/// assert!(day.offline);
/// assert!(day.events.len() >= 2);
/// ```
pub fn approximate_day(date: NaiveDate) -> DayTides {
    let moon = schaefer_phase(date.year(), date.month(), f64::from(date.day()) + 0.5);
    let amplitude = M2_AMPLITUDE_CM * (1.0 + SPRING_NEAP_SWING * moon.spring_factor());

    // M2 phase at local midnight of `date`
    let midnight_minutes =
        date.and_time(NaiveTime::MIN).and_utc().timestamp() as f64 / 60.0;
    let omega = TAU / M2_PERIOD_MINUTES;
    let phase_at_midnight = ((midnight_minutes + LUNITIDAL_OFFSET_MINUTES) * omega).rem_euclid(TAU);

    let mut events = Vec::with_capacity(4);
    // sin peaks at π/2 (high water) and bottoms at 3π/2 (low water)
    for (target_phase, level) in [
        (FRAC_PI_2, MEAN_LEVEL_CM + amplitude),
        (3.0 * FRAC_PI_2, MEAN_LEVEL_CM - amplitude),
    ] {
        let mut minute = (target_phase - phase_at_midnight).rem_euclid(TAU) / omega;
        while minute < 1440.0 {
            let whole = minute as u32;
            if let Some(time) = NaiveTime::from_hms_opt(whole / 60, whole % 60, 0) {
                events.push(TideEvent::new(time, level.round() as i32));
            }
            minute += M2_PERIOD_MINUTES;
        }
    }
    events.sort_by_key(|event| event.time);

    DayTides {
        date,
        events,
        offline: true,
    }
}

/// Caller-side fallback policy: keep decoded events, or substitute a
/// synthetic day when the bulletin had nothing for `date`.
pub fn or_synthetic(date: NaiveDate, decoded: Result<Vec<TideEvent>, TideError>) -> DayTides {
    match decoded {
        Ok(events) => DayTides {
            date,
            events,
            offline: false,
        },
        Err(error) => {
            warn!(%date, %error, "no bulletin data, using synthetic tides");
            approximate_day(date)
        }
    }
}
