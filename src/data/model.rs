use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Pollutant – a numeric measurement column subject to averaging
// ---------------------------------------------------------------------------

/// The pollutant columns the dashboard aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Pollutant {
    Co,
    So2,
    Pm10,
}

impl Pollutant {
    /// Column header in the source file.
    pub fn column(self) -> &'static str {
        match self {
            Pollutant::Co => "CO",
            Pollutant::So2 => "SO2",
            Pollutant::Pm10 => "PM10",
        }
    }

    /// Human readable label with unit.
    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Co => "CO (µg/m³)",
            Pollutant::So2 => "SO2 (µg/m³)",
            Pollutant::Pm10 => "PM10 (µg/m³)",
        }
    }

    /// The reading's value for this pollutant, `None` when the cell was empty.
    pub fn value_of(self, reading: &Reading) -> Option<f64> {
        match self {
            Pollutant::Co => reading.co,
            Pollutant::So2 => reading.so2,
            Pollutant::Pm10 => reading.pm10,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Reading – one row of the source table
// ---------------------------------------------------------------------------

/// A single sensor observation.
///
/// Pollutant cells that were empty (or `NA` / `NaN`) in the source are
/// `None`, never zero, so they drop out of means instead of dragging them down.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// The `No` column: an entry id, not unique across stations.
    pub no: Option<i64>,
    pub station: String,
    pub datetime: NaiveDateTime,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    pub pm10: Option<f64>,
}

impl Reading {
    /// Calendar date of the observation (time-of-day dropped).
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }
}

// ---------------------------------------------------------------------------
// ReadingTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded dataset. Rows are sorted by `datetime` and never change after
/// construction; filtering hands out subslices of `readings`.
#[derive(Debug, Clone, Default)]
pub struct ReadingTable {
    readings: Vec<Reading>,
    stations: BTreeSet<String>,
}

impl ReadingTable {
    /// Sort rows by timestamp and build the station index.
    ///
    /// The sort is stable so rows sharing a timestamp keep their file order.
    pub fn from_readings(mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.datetime);
        let stations = readings.iter().map(|r| r.station.clone()).collect();
        ReadingTable { readings, stations }
    }

    /// All rows, ascending by `datetime`.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Sorted set of distinct station names.
    pub fn stations(&self) -> &BTreeSet<String> {
        &self.stations
    }

    /// First and last calendar date present, `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.readings.first()?;
        let last = self.readings.last()?;
        Some((first.date(), last.date()))
    }

    /// Number of readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a reading at midnight of `date` (`YYYY-MM-DD`).
    pub(crate) fn reading(no: i64, station: &str, date: &str) -> Reading {
        let datetime = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Reading {
            no: Some(no),
            station: station.to_string(),
            datetime,
            co: None,
            so2: None,
            pm10: None,
        }
    }

    #[test]
    fn test_from_readings_sorts_by_datetime() {
        let table = ReadingTable::from_readings(vec![
            reading(3, "Dongsi", "2024-03-01"),
            reading(1, "Aotizhongxin", "2024-01-01"),
            reading(2, "Changping", "2024-02-01"),
        ]);
        let nos: Vec<Option<i64>> = table.readings().iter().map(|r| r.no).collect();
        assert_eq!(nos, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_from_readings_keeps_file_order_on_equal_timestamps() {
        let table = ReadingTable::from_readings(vec![
            reading(1, "B", "2024-01-01"),
            reading(1, "A", "2024-01-01"),
        ]);
        assert_eq!(table.readings()[0].station, "B");
        assert_eq!(table.readings()[1].station, "A");
    }

    #[test]
    fn test_date_bounds() {
        let table = ReadingTable::from_readings(vec![
            reading(2, "A", "2024-05-09"),
            reading(1, "A", "2023-12-31"),
        ]);
        assert_eq!(
            table.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 9).unwrap()
            ))
        );
        assert_eq!(ReadingTable::default().date_bounds(), None);
    }

    #[test]
    fn test_len_and_is_empty() {
        assert!(ReadingTable::default().is_empty());
        let table = ReadingTable::from_readings(vec![reading(1, "A", "2024-01-01")]);
        assert!(!table.is_empty());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_stations_are_distinct_and_sorted() {
        let table = ReadingTable::from_readings(vec![
            reading(1, "Wanliu", "2024-01-01"),
            reading(2, "Dongsi", "2024-01-01"),
            reading(3, "Wanliu", "2024-01-02"),
        ]);
        let stations: Vec<&str> = table.stations().iter().map(String::as_str).collect();
        assert_eq!(stations, vec!["Dongsi", "Wanliu"]);
    }

    #[test]
    fn test_pollutant_value_of() {
        let mut r = reading(1, "A", "2024-01-01");
        r.so2 = Some(4.5);
        assert_eq!(Pollutant::So2.value_of(&r), Some(4.5));
        assert_eq!(Pollutant::Co.value_of(&r), None);
        assert_eq!(Pollutant::Pm10.to_string(), "PM10");
    }
}
