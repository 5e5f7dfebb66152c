use std::path::PathBuf;

use chrono::NaiveDate;
use clap::builder::TypedValueParser;
use clap::Parser;

use crate::data::filter::DateRange;
use crate::data::model::ReadingTable;
use crate::data::report::DEFAULT_TOP_N;
use crate::error::DashError;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Air quality reporting dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "airquality-dash", about = "Air quality reporting dashboard", version)]
pub struct Settings {
    /// Readings file to open at startup (.csv, .json or .parquet)
    #[arg(env = "AIRQ_DATA")]
    pub data: Option<PathBuf>,

    /// First day of the initial range (YYYY-MM-DD); defaults to the first day in the data
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the initial range (YYYY-MM-DD); defaults to the last day in the data
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Number of stations in each ranking chart
    #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = clap::value_parser!(u16).range(1..=20).map(usize::from))]
    pub top: usize,

    /// Image shown at the top of the sidebar
    #[arg(long)]
    pub logo: Option<PathBuf>,

    /// Logging level, overridden by RUST_LOG
    #[arg(long, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Print the report for the initial range as JSON and exit
    #[arg(long, requires = "data")]
    pub summary: bool,
}

impl Settings {
    /// Resolve the initial date range against the loaded table.
    ///
    /// Missing bounds default to the table's own; given bounds are clamped
    /// into it. `start > end` as typed on the command line is an error.
    /// Returns `Ok(None)` for an empty table.
    pub fn initial_range(&self, table: &ReadingTable) -> Result<Option<DateRange>, DashError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            DateRange::new(start, end)?;
        }
        let Some((lo, hi)) = table.date_bounds() else {
            return Ok(None);
        };
        let requested = DateRange::new(
            self.start.unwrap_or(lo).min(self.end.unwrap_or(hi)),
            self.end.unwrap_or(hi),
        )?;
        Ok(Some(requested.clamp_to(lo, hi)))
    }
}
