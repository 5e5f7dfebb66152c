use serde::Serialize;

use super::aggregate::{self, MonthlySummary, StationMean};
use super::filter::{filter, DateRange};
use super::model::{Pollutant, ReadingTable};

// ---------------------------------------------------------------------------
// DashboardReport – everything one range selection renders
// ---------------------------------------------------------------------------

/// Default number of stations shown in each ranking chart.
pub const DEFAULT_TOP_N: usize = 5;

/// Aggregates for one date range. Built fresh on each range change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    /// `None` when the table had no dates to select from.
    pub range: Option<DateRange>,
    /// Number of readings inside the range.
    pub rows: usize,
    pub monthly: Vec<MonthlySummary>,
    /// Mean of the monthly CO means, skipping months without CO.
    pub mean_monthly_co: Option<f64>,
    /// Sum of the monthly distinct-entry counts.
    pub total_entries: usize,
    /// SO2 station ranking, highest first.
    pub so2: Vec<StationMean>,
    /// PM10 station ranking, highest (worst air) first.
    pub pm10: Vec<StationMean>,
    pub top_n: usize,
}

impl DashboardReport {
    /// Report for a table without readings.
    pub fn empty(top_n: usize) -> Self {
        DashboardReport {
            range: None,
            rows: 0,
            monthly: Vec::new(),
            mean_monthly_co: None,
            total_entries: 0,
            so2: Vec::new(),
            pm10: Vec::new(),
            top_n,
        }
    }

    /// Whether the range matched no readings at all.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Lowest / highest `top_n` stations for a ranked pollutant.
    pub fn extremes(&self, pollutant: Pollutant) -> (Vec<StationMean>, Vec<StationMean>) {
        let ranking = match pollutant {
            Pollutant::So2 => &self.so2,
            Pollutant::Pm10 => &self.pm10,
            Pollutant::Co => return (Vec::new(), Vec::new()),
        };
        (
            aggregate::lowest(ranking, self.top_n),
            aggregate::highest(ranking, self.top_n),
        )
    }
}

/// Run the filter stage and every aggregation for `range`.
pub fn build_report(table: &ReadingTable, range: &DateRange, top_n: usize) -> DashboardReport {
    let rows = filter(table, range);
    let monthly = aggregate::monthly_summary(rows);

    let co_means: Vec<f64> = monthly.iter().filter_map(|m| m.mean_co).collect();
    let mean_monthly_co =
        (!co_means.is_empty()).then(|| co_means.iter().sum::<f64>() / co_means.len() as f64);
    let total_entries = monthly.iter().map(|m| m.distinct_entry_count).sum();

    log::debug!(
        "report for {range}: {} rows, {} months",
        rows.len(),
        monthly.len()
    );

    DashboardReport {
        range: Some(*range),
        rows: rows.len(),
        mean_monthly_co,
        total_entries,
        so2: aggregate::station_means(rows, Pollutant::So2),
        pm10: aggregate::station_means(rows, Pollutant::Pm10),
        monthly,
        top_n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::reading;
    use crate::data::model::Reading;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn full(no: i64, station: &str, day: &str, co: f64, so2: f64, pm10: f64) -> Reading {
        let mut r = reading(no, station, day);
        r.co = Some(co);
        r.so2 = Some(so2);
        r.pm10 = Some(pm10);
        r
    }

    fn table() -> ReadingTable {
        ReadingTable::from_readings(vec![
            full(1, "Dongsi", "2024-01-03", 900.0, 12.0, 80.0),
            full(2, "Wanliu", "2024-01-20", 1100.0, 4.0, 60.0),
            full(3, "Dongsi", "2024-02-02", 500.0, 20.0, 140.0),
            full(4, "Tiantan", "2024-02-28", 700.0, 8.0, 40.0),
        ])
    }

    #[test]
    fn test_metrics() {
        let t = table();
        let report = build_report(&t, &DateRange::full(&t).unwrap(), DEFAULT_TOP_N);
        assert_eq!(report.rows, 4);
        assert_eq!(report.monthly.len(), 2);
        // January mean 1000, February mean 600.
        assert_eq!(report.mean_monthly_co, Some(800.0));
        assert_eq!(report.total_entries, 4);
        assert_eq!(report.so2[0].station, "Dongsi");
        assert_eq!(report.pm10.last().map(|s| s.station.as_str()), Some("Tiantan"));
    }

    #[test]
    fn test_full_range_matches_unfiltered_aggregation() {
        let t = table();
        let report = build_report(&t, &DateRange::full(&t).unwrap(), DEFAULT_TOP_N);
        assert_eq!(report.monthly, aggregate::monthly_summary(t.readings()));
        assert_eq!(report.so2, aggregate::station_means(t.readings(), Pollutant::So2));
        assert_eq!(report.pm10, aggregate::station_means(t.readings(), Pollutant::Pm10));
    }

    #[test]
    fn test_empty_range_produces_empty_report() {
        let t = table();
        let range = DateRange::new(date("2023-01-01"), date("2023-01-31")).unwrap();
        let report = build_report(&t, &range, DEFAULT_TOP_N);
        assert!(report.is_empty());
        assert!(report.monthly.is_empty());
        assert_eq!(report.mean_monthly_co, None);
        assert_eq!(report.total_entries, 0);
        assert!(report.so2.is_empty());
    }

    #[test]
    fn test_extremes_respect_top_n() {
        let t = table();
        let report = build_report(&t, &DateRange::full(&t).unwrap(), 2);
        let (low, high) = report.extremes(Pollutant::Pm10);
        let low: Vec<&str> = low.iter().map(|s| s.station.as_str()).collect();
        let high: Vec<&str> = high.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(low, vec!["Tiantan", "Wanliu"]);
        assert_eq!(high, vec!["Dongsi", "Wanliu"]);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let t = table();
        let range = DateRange::new(date("2024-02-01"), date("2024-02-29")).unwrap();
        let json = serde_json::to_value(build_report(&t, &range, 1)).unwrap();
        assert_eq!(json["rows"], 2);
        assert_eq!(json["monthly"][0]["month_end"], "2024-02-29");
        assert_eq!(json["range"]["start"], "2024-02-01");
    }

    #[test]
    fn test_empty_report_serializes_with_nulls() {
        let report = DashboardReport::empty(DEFAULT_TOP_N);
        assert!(report.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["range"].is_null());
        assert!(json["mean_monthly_co"].is_null());
        assert_eq!(json["total_entries"], 0);
        assert_eq!(json["monthly"], serde_json::json!([]));
        assert_eq!(json["top_n"], 5);
    }
}
