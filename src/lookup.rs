//! # Day Record Lookup
//!
//! Finds the bulletin line for a date. Each line of a yearly bulletin carries a
//! day marker: the two-digit year, the month and the day, immediately followed
//! by a two-character station code and then that day's digit stream:
//!
//! ```text
//! ...hourly heights...  25 1 3TK 507162172817199999999999999...
//!                       ^^^^^^^^ marker (yy, month, day, station)
//! ```
//!
//! Bulletins seen in the wild do not agree on the spacing of the date fields,
//! so the lookup tries each [`MarkerLayout`] in turn on every line.

use crate::{DayRecord, TideError};
use regex::Regex;
use tracing::debug;

/// The observed spacings of the `yy mm dd` fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerLayout {
    /// Month and day right-aligned in two columns: `25 1 3`, `251012`
    FixedWidth,
    /// Single spaces between the fields: `25 1 3`, `25 10 12`
    SingleSpace,
    /// Any run of whitespace between the fields: `25  1   3`
    MultiSpace,
    /// Zero-padded month and day: `250103`
    ZeroPadded,
}

impl MarkerLayout {
    /// Layouts in the order they are tried.
    pub const ALL: [MarkerLayout; 4] = [
        MarkerLayout::FixedWidth,
        MarkerLayout::SingleSpace,
        MarkerLayout::MultiSpace,
        MarkerLayout::ZeroPadded,
    ];

    /// Regex source matching just the date fields for this layout.
    fn date_pattern(self, yy: u8, month: u32, day: u32) -> String {
        match self {
            MarkerLayout::FixedWidth => format!("{yy:02}{month:>2}{day:>2}"),
            MarkerLayout::SingleSpace => format!("{yy:02} {month} {day}"),
            MarkerLayout::MultiSpace => format!(r"{yy:02}\s+{month}\s+{day}"),
            MarkerLayout::ZeroPadded => format!("{yy:02}{month:02}{day:02}"),
        }
    }
}

/// Compiled matchers for one layout and date.
struct Marker {
    layout: MarkerLayout,
    /// Date fields followed by the station code
    record: Regex,
    /// Date fields alone, used to spot records missing their station code
    date_only: Regex,
}

impl Marker {
    fn new(layout: MarkerLayout, yy: u8, month: u32, day: u32) -> Self {
        let date = layout.date_pattern(yy, month, day);
        // Patterns are assembled from integers and fixed literals only.
        let record = Regex::new(&format!("{date}([A-Z][A-Z0-9])"))
            .expect("marker pattern should be valid");
        let date_only = Regex::new(&date).expect("marker pattern should be valid");
        Self {
            layout,
            record,
            date_only,
        }
    }
}

/// Locate the record for `(yy, month, day)` in a year's bulletin text.
///
/// `yy` is the bulletin's two-digit year (`year % 100`). Lines are scanned top
/// to bottom and every layout is tried on each line; the first line carrying a
/// complete marker wins.
///
/// # Errors
/// - [`TideError::NotFound`] when no line mentions the date
/// - [`TideError::MalformedRecord`] when the date only appears without a
///   station code after it
///
/// # Example
/// ```
/// use tide_engine_lib::lookup::find_day_record;
///
/// let text = "  25 1 2TK 4531541712160\n  25 1 3TK 507162172817199999999\n";
/// let record = find_day_record(text, 25, 1, 3).unwrap();
/// assert_eq!(record.station, "TK");
/// assert_eq!(record.raw_digit_stream, "507162172817199999999");
///
/// assert!(find_day_record(text, 25, 1, 4).is_err());
/// ```
pub fn find_day_record(text: &str, yy: u8, month: u32, day: u32) -> Result<DayRecord, TideError> {
    let markers: Vec<Marker> = MarkerLayout::ALL
        .iter()
        .map(|&layout| Marker::new(layout, yy, month, day))
        .collect();

    let mut malformed: Option<String> = None;

    for (line_no, line) in text.lines().enumerate() {
        for marker in &markers {
            if let Some(caps) = marker.record.captures(line) {
                let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let raw_digit_stream: String = line[whole.end()..]
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();

                debug!(
                    line = line_no + 1,
                    layout = ?marker.layout,
                    station = code.as_str(),
                    "found bulletin record for {month}/{day}"
                );

                return Ok(DayRecord {
                    year: yy,
                    month: month as u8,
                    day: day as u8,
                    station: code.as_str().to_string(),
                    raw_digit_stream,
                });
            }

            if malformed.is_none() && marker.date_only.is_match(line) {
                malformed = Some(line.to_string());
            }
        }
    }

    match malformed {
        Some(line) => {
            debug!("date {month}/{day} present without station code");
            Err(TideError::MalformedRecord { line })
        }
        None => {
            debug!("no bulletin record for {month}/{day}");
            Err(TideError::NotFound { month, day })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 24 three-column hourly heights, as they precede the marker.
    fn hourly_block() -> String {
        (0..24).map(|h| format!("{:>3}", 80 + h * 3)).collect()
    }

    #[test]
    fn finds_fixed_width_marker() {
        let text = format!(
            "{}25 1 2TK 4531541712160\n{}25 1 3TK 507162172817199999999\n",
            hourly_block(),
            hourly_block()
        );
        let record = find_day_record(&text, 25, 1, 3).unwrap();
        assert_eq!(record.year, 25);
        assert_eq!(record.month, 1);
        assert_eq!(record.day, 3);
        assert_eq!(record.station, "TK");
        assert_eq!(record.raw_digit_stream, "507162172817199999999");
    }

    #[test]
    fn finds_two_digit_month_and_day() {
        let text = format!("{}251012TK1030170 432 58\n", hourly_block());
        let record = find_day_record(&text, 25, 10, 12).unwrap();
        assert_eq!(record.raw_digit_stream, "103017043258");
    }

    #[test]
    fn finds_single_space_marker() {
        let text = "25 10 12OS1030170\n";
        let record = find_day_record(text, 25, 10, 12).unwrap();
        assert_eq!(record.station, "OS");
        assert_eq!(record.raw_digit_stream, "1030170");
    }

    #[test]
    fn finds_multi_space_marker() {
        let text = "25   7    4Z1 612180\n";
        let record = find_day_record(text, 25, 7, 4).unwrap();
        assert_eq!(record.station, "Z1");
        assert_eq!(record.raw_digit_stream, "612180");
    }

    #[test]
    fn finds_zero_padded_marker() {
        let text = "250704TK 612180\n";
        let record = find_day_record(text, 25, 7, 4).unwrap();
        assert_eq!(record.raw_digit_stream, "612180");
    }

    #[test]
    fn does_not_confuse_neighbouring_days() {
        let text = "25 1 1TK1111111\n25 110TK2222222\n25 111TK3333333\n";
        assert_eq!(
            find_day_record(text, 25, 1, 1).unwrap().raw_digit_stream,
            "1111111"
        );
        assert_eq!(
            find_day_record(text, 25, 1, 10).unwrap().raw_digit_stream,
            "2222222"
        );
        assert_eq!(
            find_day_record(text, 25, 1, 11).unwrap().raw_digit_stream,
            "3333333"
        );
    }

    #[test]
    fn returns_first_matching_line() {
        let text = "25 1 3TK1111111\n25 1 3TK2222222\n";
        let record = find_day_record(text, 25, 1, 3).unwrap();
        assert_eq!(record.raw_digit_stream, "1111111");
    }

    #[test]
    fn other_year_is_not_found() {
        let text = "24 1 3TK1111111\n";
        assert_eq!(
            find_day_record(text, 25, 1, 3),
            Err(TideError::NotFound { month: 1, day: 3 })
        );
    }

    #[test]
    fn missing_station_code_is_malformed() {
        let text = "25 1 3 1234567\n";
        let err = find_day_record(text, 25, 1, 3).unwrap_err();
        assert!(matches!(err, TideError::MalformedRecord { .. }));
        assert!(err.is_missing_data());
    }

    #[test]
    fn empty_text_is_not_found() {
        assert!(matches!(
            find_day_record("", 25, 1, 3),
            Err(TideError::NotFound { .. })
        ));
    }
}
