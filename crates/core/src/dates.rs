//! Half-open date ranges used for availability searches and restrictions.
//!
//! A range `[start, end)` includes `start` and excludes `end`, so a stay from
//! 2050-01-01 to 2050-01-02 is one night and does not collide with a stay that
//! begins on 2050-01-02.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Wire format for dates in forms, query strings and JSON (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date, naming `field` in the error message.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::Validation(format!("{field} date is invalid")))
}

/// Format a date in the wire format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A half-open interval of calendar dates, `[start, end)`.
///
/// `end < start` is rejected on construction. `start == end` is allowed and
/// represents an empty interval that overlaps nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::Validation(
                "end date must not be before start date".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from their `YYYY-MM-DD` representations.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        let start = parse_date("start", start)?;
        let end = parse_date("end", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of nights covered by the range.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Half-open overlap test: `a.start < b.end && b.start < a.end`.
    ///
    /// Empty ranges overlap nothing, including themselves.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end
            && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse(start, end).unwrap()
    }

    #[test]
    fn parses_wire_format() {
        let r = range("2050-01-01", "2050-01-04");
        assert_eq!(format_date(r.start()), "2050-01-01");
        assert_eq!(format_date(r.end()), "2050-01-04");
        assert_eq!(r.nights(), 3);
    }

    #[test]
    fn garbled_start_names_the_field() {
        let err = DateRange::parse("01/01/2050", "2050-01-02").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "start date is invalid");
    }

    #[test]
    fn garbled_end_names_the_field() {
        let err = DateRange::parse("2050-01-01", "tomorrow").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "end date is invalid");
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_matches!(
            DateRange::parse("2050-01-05", "2050-01-01"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let a = range("2050-01-01", "2050-01-03");
        let b = range("2050-01-03", "2050-01-05");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn partial_and_contained_ranges_overlap() {
        let stay = range("2050-01-02", "2050-01-06");
        assert!(stay.overlaps(&range("2050-01-01", "2050-01-03")));
        assert!(stay.overlaps(&range("2050-01-05", "2050-01-09")));
        assert!(stay.overlaps(&range("2050-01-03", "2050-01-04")));
        assert!(stay.overlaps(&range("2049-12-01", "2050-02-01")));
    }

    #[test]
    fn empty_range_overlaps_nothing() {
        let empty = range("2050-01-03", "2050-01-03");
        let around = range("2050-01-01", "2050-01-05");
        assert!(empty.is_empty());
        assert!(!empty.overlaps(&around));
        assert!(!around.overlaps(&empty));
        assert!(!empty.overlaps(&empty));
    }
}
