use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{Reading, ReadingTable};
use crate::error::DashError;

// ---------------------------------------------------------------------------
// DateRange – inclusive calendar-date bounds
// ---------------------------------------------------------------------------

/// An inclusive `[start, end]` range of calendar dates. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashError> {
        if start > end {
            return Err(DashError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// The range spanning every date in `table`, `None` for an empty table.
    pub fn full(table: &ReadingTable) -> Option<Self> {
        table
            .date_bounds()
            .map(|(start, end)| DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Narrow the range to `[lo, hi]`. When the two do not overlap the
    /// result collapses onto the nearest bound.
    pub fn clamp_to(&self, lo: NaiveDate, hi: NaiveDate) -> Self {
        let start = self.start.clamp(lo, hi);
        let end = self.end.clamp(start, hi.max(start));
        DateRange { start, end }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Filter stage
// ---------------------------------------------------------------------------

/// Return the readings whose calendar date falls inside `range`.
///
/// Only the date component of `datetime` takes part in the comparison, so a
/// reading at 23:59 on `range.end()` is kept. The table is sorted by
/// timestamp, which makes the match a contiguous subslice found with two
/// binary searches.
pub fn filter<'a>(table: &'a ReadingTable, range: &DateRange) -> &'a [Reading] {
    let rows = table.readings();
    let lo = rows.partition_point(|r| r.date() < range.start);
    let hi = rows.partition_point(|r| r.date() <= range.end);
    if lo >= hi {
        return &[];
    }
    &rows[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::reading;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_table() -> ReadingTable {
        let mut late = reading(4, "A", "2024-01-02");
        late.datetime = date("2024-01-02").and_hms_opt(23, 59, 0).unwrap();
        ReadingTable::from_readings(vec![
            reading(1, "A", "2023-12-31"),
            reading(2, "A", "2024-01-01"),
            reading(3, "B", "2024-01-02"),
            late,
            reading(5, "B", "2024-01-03"),
        ])
    }

    fn nos(rows: &[Reading]) -> Vec<i64> {
        rows.iter().filter_map(|r| r.no).collect()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let err = DateRange::new(date("2024-02-01"), date("2024-01-01")).unwrap_err();
        assert_eq!(
            err,
            DashError::InvalidRange {
                start: date("2024-02-01"),
                end: date("2024-01-01"),
            }
        );
    }

    #[test]
    fn test_filter_is_inclusive_on_both_ends() {
        let table = sample_table();
        let range = DateRange::new(date("2024-01-01"), date("2024-01-02")).unwrap();
        assert_eq!(nos(filter(&table, &range)), vec![2, 3, 4]);
    }

    #[test]
    fn test_single_day_range_ignores_time_of_day() {
        let table = sample_table();
        let day = date("2024-01-02");
        let range = DateRange::new(day, day).unwrap();
        let rows = filter(&table, &range);
        assert_eq!(nos(rows), vec![3, 4]);
        assert!(rows.iter().all(|r| r.date() == day));
    }

    #[test]
    fn test_full_range_returns_everything() {
        let table = sample_table();
        let range = DateRange::full(&table).unwrap();
        assert_eq!(filter(&table, &range).len(), table.len());
    }

    #[test]
    fn test_range_without_rows_is_empty() {
        let table = sample_table();
        let range = DateRange::new(date("2025-01-01"), date("2025-12-31")).unwrap();
        assert!(filter(&table, &range).is_empty());
        assert!(DateRange::full(&ReadingTable::default()).is_none());
    }

    #[test]
    fn test_clamp_to_bounds() {
        let range = DateRange::new(date("2020-01-01"), date("2030-01-01")).unwrap();
        let clamped = range.clamp_to(date("2024-01-01"), date("2024-06-30"));
        assert_eq!(clamped.start(), date("2024-01-01"));
        assert_eq!(clamped.end(), date("2024-06-30"));

        let outside = DateRange::new(date("2025-01-01"), date("2025-02-01")).unwrap();
        let clamped = outside.clamp_to(date("2024-01-01"), date("2024-06-30"));
        assert_eq!(clamped.start(), date("2024-06-30"));
        assert_eq!(clamped.end(), date("2024-06-30"));
    }
}
