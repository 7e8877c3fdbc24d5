//! # Tide Bulletin Decoding
//!
//! Turns a day's digit stream into [`TideEvent`]s, and wraps the lookup and
//! decoding steps into per-day, per-window and per-year entry points.
//!
//! ## Digit Stream Format
//!
//! Once whitespace is stripped, a day's record is a run of `(time, height)`
//! groups with no delimiters. Three group shapes occur:
//!
//! | width | layout   | fields                         | accepted when              |
//! |-------|----------|--------------------------------|----------------------------|
//! | 7     | `HHMMhhh`| 2-digit hour, minute, 3-digit height | hour ≤ 23, minute ≤ 59 |
//! | 6     | `HMMhhh` | 1-digit hour, minute, 3-digit height | hour ≤ 9, minute ≤ 59  |
//! | 6     | `HHMMhh` | 2-digit hour, minute, 2-digit height | hour ≤ 23, minute ≤ 59, height < 100 |
//!
//! The shapes are tried in exactly that order at every offset. Some digit runs
//! satisfy more than one shape; the order was fitted against real bulletins
//! and must not be changed.
//!
//! `999999` at a group boundary ends the day. A position where no shape fits
//! is skipped one byte at a time. At most [`MAX_EVENTS_PER_DAY`] events are
//! decoded.

use crate::lookup::find_day_record;
use crate::{TideError, TideEvent};
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use tracing::debug;

/// Marks the end of a day's data.
pub const END_SENTINEL: &[u8] = b"999999";

/// Bulletins list at most four highs and four lows per day.
pub const MAX_EVENTS_PER_DAY: usize = 8;

/// The three group shapes, in precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupLayout {
    /// `HHMMhhh`
    Long,
    /// `HMMhhh`
    TimeMajor,
    /// `HHMMhh`
    HeightMinor,
}

impl GroupLayout {
    pub const PRECEDENCE: [GroupLayout; 3] = [
        GroupLayout::Long,
        GroupLayout::TimeMajor,
        GroupLayout::HeightMinor,
    ];

    /// Number of bytes a group of this shape consumes.
    pub fn width(self) -> usize {
        match self {
            GroupLayout::Long => 7,
            GroupLayout::TimeMajor | GroupLayout::HeightMinor => 6,
        }
    }

    /// Decode one group at the start of `bytes`, if this shape accepts it.
    fn decode(self, bytes: &[u8]) -> Option<TideEvent> {
        let group = bytes.get(..self.width())?;

        // Byte ranges of hour, minute and height inside the group.
        let (hour_end, minute_end) = match self {
            GroupLayout::TimeMajor => (1, 3),
            GroupLayout::Long | GroupLayout::HeightMinor => (2, 4),
        };
        let hour = digits(&group[..hour_end])?;
        let minute = digits(&group[hour_end..minute_end])?;
        let height = digits(&group[minute_end..])?;

        let max_hour = match self {
            GroupLayout::TimeMajor => 9,
            GroupLayout::Long | GroupLayout::HeightMinor => 23,
        };
        if hour > max_hour || minute > 59 {
            return None;
        }
        if self == GroupLayout::HeightMinor && height >= 100 {
            return None;
        }

        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(TideEvent::new(time, height as i32))
    }
}

/// Parse an all-ASCII-digit slice.
fn digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(bytes.iter().fold(0, |acc, b| acc * 10 + u32::from(b - b'0')))
}

/// Result of decoding one digit stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Decoded events in stream order
    pub events: Vec<TideEvent>,
    /// Offsets where no group shape fitted and one byte was skipped
    pub skipped_offsets: Vec<usize>,
    /// True if decoding stopped on the `999999` sentinel
    pub hit_sentinel: bool,
}

/// Decode a day's digit stream into tide events.
///
/// Never fails: unparseable bytes are skipped and reported in
/// [`DecodeOutcome::skipped_offsets`]. An empty `events` list means the day has
/// no data.
///
/// # Example
/// ```
/// use tide_engine_lib::bulletin::decode_digit_stream;
/// use tide_engine_lib::TideKind;
///
/// let outcome = decode_digit_stream("507162 1144048 1728171 2353031 999999");
/// let shown: Vec<String> = outcome.events.iter().map(|e| e.to_string()).collect();
/// assert_eq!(
///     shown,
///     ["05:07/162/High", "11:44/48/Low", "17:28/171/High", "23:53/31/Low"]
/// );
/// assert!(outcome.hit_sentinel);
/// assert!(outcome.events.iter().all(|e| (e.kind == TideKind::High) == (e.level_cm >= 100)));
/// ```
pub fn decode_digit_stream(stream: &str) -> DecodeOutcome {
    let bytes: Vec<u8> = stream
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let mut outcome = DecodeOutcome {
        events: Vec::with_capacity(MAX_EVENTS_PER_DAY),
        ..DecodeOutcome::default()
    };
    let mut offset = 0;

    while offset < bytes.len() && outcome.events.len() < MAX_EVENTS_PER_DAY {
        let rest = &bytes[offset..];

        if rest.starts_with(END_SENTINEL) {
            outcome.hit_sentinel = true;
            break;
        }

        let accepted = GroupLayout::PRECEDENCE
            .iter()
            .find_map(|&layout| layout.decode(rest).map(|event| (layout, event)));

        match accepted {
            Some((layout, event)) => {
                outcome.events.push(event);
                offset += layout.width();
            }
            None => {
                debug!(offset, "unparseable tide group, skipping one byte");
                outcome.skipped_offsets.push(offset);
                offset += 1;
            }
        }
    }

    outcome
}

/// Look up and decode the events for one date.
///
/// # Errors
/// - [`TideError::NotFound`] / [`TideError::MalformedRecord`] from the lookup
/// - [`TideError::EmptyDay`] when the record decodes to nothing
pub fn parse_day(text: &str, date: NaiveDate) -> Result<Vec<TideEvent>, TideError> {
    let yy = date.year().rem_euclid(100) as u8;
    let record = find_day_record(text, yy, date.month(), date.day())?;
    let outcome = decode_digit_stream(&record.raw_digit_stream);

    if !outcome.skipped_offsets.is_empty() {
        debug!(
            %date,
            skipped = outcome.skipped_offsets.len(),
            decoded = outcome.events.len(),
            "partially decoded bulletin record"
        );
    }

    if outcome.events.is_empty() {
        return Err(TideError::EmptyDay { date });
    }
    Ok(outcome.events)
}

/// Decode `days` consecutive dates starting at `start`.
///
/// Every day is looked up independently; one bad day does not affect the rest.
pub fn parse_window(
    text: &str,
    start: NaiveDate,
    days: usize,
) -> Vec<(NaiveDate, Result<Vec<TideEvent>, TideError>)> {
    start
        .iter_days()
        .take(days)
        .map(|date| (date, parse_day(text, date)))
        .collect()
}

/// Decode every date of `year` that the bulletin has data for.
pub fn parse_year(text: &str, year: i32) -> BTreeMap<NaiveDate, Vec<TideEvent>> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return BTreeMap::new();
    };

    first
        .iter_days()
        .take_while(|date| date.year() == year)
        .filter_map(|date| parse_day(text, date).ok().map(|events| (date, events)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideKind;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn long_group_wins_over_shorter_shapes() {
        // "123045" would also be a valid 6-byte time-major group.
        let outcome = decode_digit_stream("1230456");
        assert_eq!(outcome.events, vec![TideEvent::new(hm(12, 30), 456)]);
    }

    #[test]
    fn time_major_wins_over_height_minor() {
        let outcome = decode_digit_stream("123045");
        assert_eq!(outcome.events, vec![TideEvent::new(hm(1, 23), 45)]);
    }

    #[test]
    fn height_minor_used_when_others_reject() {
        // Time-major would read minute 60.
        let outcome = decode_digit_stream("160545");
        assert_eq!(outcome.events, vec![TideEvent::new(hm(16, 5), 45)]);
        assert_eq!(outcome.events[0].kind, TideKind::Low);
    }

    #[test]
    fn single_digit_hour_before_long_group() {
        let outcome = decode_digit_stream("5071621728171");
        assert_eq!(
            outcome.events,
            vec![
                TideEvent::new(hm(5, 7), 162),
                TideEvent::new(hm(17, 28), 171)
            ]
        );
    }

    #[test]
    fn sentinel_stops_decoding() {
        let outcome = decode_digit_stream("1728171999999 6 5 30");
        assert_eq!(outcome.events, vec![TideEvent::new(hm(17, 28), 171)]);
        assert!(outcome.hit_sentinel);
        assert!(outcome.skipped_offsets.is_empty());
    }

    #[test]
    fn sentinel_at_start_gives_empty_day() {
        let outcome = decode_digit_stream("99999999999999");
        assert!(outcome.events.is_empty());
        assert!(outcome.hit_sentinel);
    }

    #[test]
    fn garbage_is_skipped_byte_by_byte() {
        let outcome = decode_digit_stream("x-1230456");
        assert_eq!(outcome.skipped_offsets, vec![0, 1]);
        assert_eq!(outcome.events, vec![TideEvent::new(hm(12, 30), 456)]);
    }

    #[test]
    fn short_tail_is_skipped() {
        let outcome = decode_digit_stream("123045612");
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.skipped_offsets, vec![7, 8]);
        assert!(!outcome.hit_sentinel);
    }

    #[test]
    fn caps_at_eight_events() {
        let stream: String = (0..10).map(|i| format!("{:02}00150", 10 + i)).collect();
        let outcome = decode_digit_stream(&stream);
        assert_eq!(outcome.events.len(), MAX_EVENTS_PER_DAY);
        assert_eq!(outcome.events[7].time, hm(17, 0));
    }

    #[test]
    fn illustrative_stream_follows_precedence() {
        // 12:44/823 and 05:31/999 are where the precedence order, not the
        // data, decides the reading.
        let outcome = decode_digit_stream("50716217281711244823531999999");
        let shown: Vec<String> = outcome.events.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            shown,
            [
                "05:07/162/High",
                "17:28/171/High",
                "12:44/823/High",
                "05:31/999/High"
            ]
        );
        assert_eq!(outcome.skipped_offsets, vec![26, 27, 28]);
    }

    #[test]
    fn unpadded_low_before_more_digits_reads_as_long_group() {
        // " 48" loses its padding with the whitespace, so the next group's
        // first digit completes a 3-digit height.
        let outcome = decode_digit_stream("1144 481728171");
        assert_eq!(outcome.events[0], TideEvent::new(hm(11, 44), 481));
    }

    #[test]
    fn empty_stream_decodes_to_nothing() {
        assert_eq!(decode_digit_stream(""), DecodeOutcome::default());
    }

    fn bulletin() -> String {
        [
            "25 1 2TK 445048 1116168 1717030 2353021",
            "25 1 3TK 507162 1144048 1728171 2353031 999999",
            "25 1 4TK999999",
            "25 1 5",
        ]
        .join("\n")
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn parse_day_decodes_record() {
        let events = parse_day(&bulletin(), date(3)).unwrap();
        let shown: Vec<String> = events.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            shown,
            [
                "05:07/162/High",
                "11:44/48/Low",
                "17:28/171/High",
                "23:53/31/Low"
            ]
        );
    }

    #[test]
    fn parse_day_reports_each_kind_of_absence() {
        let text = bulletin();
        assert_eq!(
            parse_day(&text, date(4)),
            Err(TideError::EmptyDay { date: date(4) })
        );
        assert!(matches!(
            parse_day(&text, date(5)),
            Err(TideError::MalformedRecord { .. })
        ));
        assert_eq!(
            parse_day(&text, date(6)),
            Err(TideError::NotFound { month: 1, day: 6 })
        );
    }

    #[test]
    fn window_keeps_days_independent() {
        let window = parse_window(&bulletin(), date(2), 5);
        let dates: Vec<NaiveDate> = window.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date(2), date(3), date(4), date(5), date(6)]);
        assert!(window[0].1.is_ok());
        assert!(window[1].1.is_ok());
        assert!(window[2].1.is_err());
        assert!(window[4].1.is_err());
    }

    #[test]
    fn year_collects_decodable_days() {
        let year = parse_year(&bulletin(), 2025);
        assert_eq!(year.keys().copied().collect::<Vec<_>>(), vec![date(2), date(3)]);
        assert!(parse_year(&bulletin(), 2024).is_empty());
    }
}
