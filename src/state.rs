use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::data::filter::DateRange;
use crate::data::loader::load_file;
use crate::data::model::ReadingTable;
use crate::data::report::{build_report, DashboardReport, DEFAULT_TOP_N};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until a file is loaded). Read-only once set.
    pub table: Option<Arc<ReadingTable>>,

    /// Date picker values. May be inverted while the user is editing.
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// Aggregates for the current `start..=end` (cached).
    pub report: Option<DashboardReport>,

    /// Stations per ranking chart.
    pub top_n: usize,

    /// Optional sidebar image.
    pub logo: Option<PathBuf>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            table: None,
            start: NaiveDate::MIN,
            end: NaiveDate::MIN,
            report: None,
            top_n: DEFAULT_TOP_N,
            logo: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded table and show `range`, or the full range when
    /// `None` is given.
    pub fn set_table(&mut self, table: ReadingTable, range: Option<DateRange>) {
        let range = range.or_else(|| DateRange::full(&table));
        if let Some(range) = range {
            self.start = range.start();
            self.end = range.end();
        }
        self.table = Some(Arc::new(table));
        self.status_message = None;
        self.refresh();
    }

    /// Load `path` and show its full range. On failure the current table
    /// stays and the error goes to the status line.
    pub fn open(&mut self, path: &Path) {
        match load_file(path) {
            Ok(table) => self.set_table(table, None),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Earliest and latest selectable dates.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.table.as_ref().and_then(|t| t.date_bounds())
    }

    /// Number of readings in the loaded table.
    pub fn total_rows(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.len())
    }

    /// Recompute `report` after a date change.
    ///
    /// An inverted range clears the report and surfaces the error instead.
    pub fn refresh(&mut self) {
        let Some(table) = &self.table else {
            self.report = None;
            return;
        };
        match DateRange::new(self.start, self.end) {
            Ok(range) => {
                self.report = Some(build_report(table, &range, self.top_n));
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("{e}");
                self.report = None;
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// Set one end of the range and recompute.
    pub fn set_start(&mut self, date: NaiveDate) {
        self.start = date;
        self.refresh();
    }

    pub fn set_end(&mut self, date: NaiveDate) {
        self.end = date;
        self.refresh();
    }

    /// Reset the pickers to the table's full date span.
    pub fn reset_range(&mut self) {
        if let Some((lo, hi)) = self.bounds() {
            self.start = lo;
            self.end = hi;
            self.refresh();
        }
    }
}
