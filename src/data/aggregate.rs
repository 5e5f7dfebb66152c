//! Summary tables derived from a (filtered) slice of readings.
//!
//! Every function here borrows its input and builds a fresh output, so the
//! same filtered slice can feed all of them in turn.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::model::{Pollutant, Reading};

// ---------------------------------------------------------------------------
// Running mean over optional values
// ---------------------------------------------------------------------------

/// Sum and count of the present values seen so far.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

/// One calendar month of readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// Last day of the month; the bucket key.
    pub month_end: NaiveDate,
    /// Number of distinct `No` values among the month's readings.
    pub distinct_entry_count: usize,
    /// Mean CO of the month, `None` when every CO cell was empty.
    pub mean_co: Option<f64>,
}

#[derive(Default)]
struct MonthBucket {
    entries: HashSet<i64>,
    co: MeanAccumulator,
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Group readings by calendar month.
///
/// Months without readings are absent rather than zero-filled. Output is
/// ascending by `month_end`; an empty slice yields an empty vector.
pub fn monthly_summary(readings: &[Reading]) -> Vec<MonthlySummary> {
    let mut buckets: BTreeMap<NaiveDate, MonthBucket> = BTreeMap::new();

    for r in readings {
        let bucket = buckets.entry(month_end(r.date())).or_default();
        if let Some(no) = r.no {
            bucket.entries.insert(no);
        }
        bucket.co.push(r.co);
    }

    buckets
        .into_iter()
        .map(|(month_end, bucket)| MonthlySummary {
            month_end,
            distinct_entry_count: bucket.entries.len(),
            mean_co: bucket.co.mean(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Station ranking
// ---------------------------------------------------------------------------

/// Mean of one pollutant at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMean {
    pub station: String,
    pub mean: f64,
}

/// Per-station mean of `pollutant`, highest first.
///
/// Stations with no present value for the pollutant are left out. Equal
/// means keep the order in which their stations first appear in `readings`.
pub fn station_means(readings: &[Reading], pollutant: Pollutant) -> Vec<StationMean> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, MeanAccumulator)> = Vec::new();

    for r in readings {
        let slot = *index.entry(r.station.as_str()).or_insert_with(|| {
            groups.push((r.station.as_str(), MeanAccumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.push(pollutant.value_of(r));
    }

    let mut ranking: Vec<StationMean> = groups
        .into_iter()
        .filter_map(|(station, acc)| {
            acc.mean().map(|mean| StationMean {
                station: station.to_string(),
                mean,
            })
        })
        .collect();

    // `sort_by` is stable: ties stay in discovery order.
    ranking.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ranking
}

/// The `n` stations with the highest mean.
pub fn highest(ranking: &[StationMean], n: usize) -> Vec<StationMean> {
    ranking.iter().take(n).cloned().collect()
}

/// The `n` stations with the lowest mean, lowest first.
///
/// Walks the descending ranking backwards, so on ties this is exactly the
/// reverse of [`highest`] over the same slice.
pub fn lowest(ranking: &[StationMean], n: usize) -> Vec<StationMean> {
    ranking.iter().rev().take(n).cloned().collect()
}
