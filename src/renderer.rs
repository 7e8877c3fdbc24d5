//! # Plain-Text Rendering
//!
//! Development output for the terminal: a table of a day's events, a one-line
//! "now" summary and an ASCII tide curve. The real dashboard draws its own
//! charts; this is only what the CLI prints.

use crate::{DayTides, TideSample, TideSeries};
use std::fmt::Write;

/// Chart height in text rows
const ROWS: usize = 16;

/// Width reserved for the Y-axis labels
const Y_AXIS_WIDTH: usize = 5;

/// One line per event, prefixed with the date and an offline marker.
pub fn render_day(day: &DayTides) -> String {
    let mut out = String::new();
    let marker = if day.offline { "  ⚠ OFFLINE" } else { "" };
    let _ = writeln!(out, "{}{marker}", day.date.format("%Y-%m-%d (%a)"));

    for event in &day.events {
        let _ = writeln!(
            out,
            "  {}  {:>4} cm  {}",
            event.time.format("%H:%M"),
            event.level_cm,
            event.kind
        );
    }
    out
}

/// Current level, trend and countdown.
pub fn render_state(state: &TideSample) -> String {
    let trend = if state.is_rising { "rising" } else { "falling" };
    format!(
        "now {:.0} cm, {trend}; next {} {} cm at {} (in {})",
        state.level_cm,
        state.next_event.kind,
        state.next_event.level_cm,
        state.next_event.time.format("%H:%M"),
        state.time_until_next
    )
}

/// ASCII curve of a day's series with an `X` at `now_minute`.
///
/// Columns are curve samples, so at the default 10-minute spacing the chart is
/// 145 characters wide plus the axis.
pub fn draw_ascii(series: &TideSeries, now_minute: Option<u16>) -> String {
    let mut out = String::new();
    if series.samples.is_empty() {
        return out;
    }

    let (min_cm, max_cm) = series
        .samples
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), sample| {
            (min.min(sample.level_cm), max.max(sample.level_cm))
        });
    let range = (max_cm - min_cm).max(1.0);

    let level_to_row = |level_cm: f32| {
        let normalized = (level_cm - min_cm) / range;
        ((1.0 - normalized) * (ROWS as f32 - 1.0)).round() as usize
    };

    // Column nearest to "now"
    let now_column = now_minute.and_then(|now| {
        series
            .samples
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.minute_of_day.abs_diff(now))
            .map(|(i, _)| i)
    });

    let mut grid = vec![vec![' '; series.samples.len() + Y_AXIS_WIDTH]; ROWS];

    // Y-axis: top, middle and bottom labels
    for level in [max_cm, (max_cm + min_cm) / 2.0, min_cm] {
        let row = level_to_row(level).min(ROWS - 1);
        let label = format!("{:<width$}", level.round() as i32, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for (column, sample) in series.samples.iter().enumerate() {
        let row = level_to_row(sample.level_cm).min(ROWS - 1);
        grid[row][column + Y_AXIS_WIDTH] = if Some(column) == now_column { 'X' } else { '•' };
    }

    if series.offline {
        let _ = writeln!(out, "⚠ OFFLINE");
    }
    for row in grid {
        let _ = writeln!(out, "{}", row.into_iter().collect::<String>().trim_end());
    }

    // Hour ticks under the chart, every 6 hours
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let ticks: String = series
        .samples
        .iter()
        .map(|s| if s.minute_of_day % 360 == 0 { '|' } else { ' ' })
        .collect();
    let _ = writeln!(out, "{padding}{}", ticks.trim_end());
    out
}
