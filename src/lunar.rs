//! Moon phase (Schaefer 1985)
//!
//! Low-precision phase routine from Sky & Telescope (Mar 1985). Accuracy is
//! about ±1 day, which is plenty for scaling the spring–neap envelope of the
//! synthetic fallback tides.

use core::f64::consts::TAU;

/// Mean synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_2;

/// Phase of the Moon on a given day.
#[derive(Debug, Clone, Copy)]
pub struct MoonPhase {
    /// Phase index 0 – 7 (0 = new, 4 = full).
    pub phase_index: u8,
    /// Age of the Moon in days since new.
    pub age_days: f64,
}

impl MoonPhase {
    /// +1 at new and full moon (spring tides), -1 at the quarters (neaps).
    pub fn spring_factor(&self) -> f64 {
        (2.0 * TAU * self.age_days / SYNODIC_MONTH_DAYS).cos()
    }
}

/// Schaefer's phase for a proleptic-Gregorian date.
///
/// `month` is 1 = Jan … 12 = Dec; `day` may be fractional (noon = .5).
pub fn schaefer_phase(year: i32, month: u32, day: f64) -> MoonPhase {
    // Jan/Feb count as months 13/14 of the previous year
    let (mut y, mut m) = (year, month as i32);
    if m < 3 {
        y -= 1;
        m += 12;
    }
    m += 1;

    // Days since the 1900-01-00 12 UT new moon
    let days = (365.25 * f64::from(y)).floor() + (30.6 * f64::from(m)).floor() + day - 694_039.09;

    let mut cycles = days / SYNODIC_MONTH_DAYS;
    cycles -= cycles.floor();

    MoonPhase {
        phase_index: ((cycles * 8.0) + 0.5).floor() as u8 & 7,
        age_days: cycles * SYNODIC_MONTH_DAYS,
    }
}
