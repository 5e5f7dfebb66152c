use chrono::NaiveDate;
use thiserror::Error;

/// Typed failures of the load → filter → aggregate pipeline.
///
/// Loader and entry-point code carries these inside `anyhow::Error` so a
/// context chain can be attached; callers that need to react to a specific
/// case use `downcast_ref::<DashError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashError {
    /// The start of a date range lies after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A required column is absent from the input file.
    #[error("Input is missing required column '{0}'")]
    MissingColumn(String),

    /// A `datetime` cell could not be parsed as a timestamp.
    #[error("Row {row}: cannot parse datetime '{value}'")]
    DatetimeParse { row: usize, value: String },

    /// The input file extension is not one of csv / json / parquet.
    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}
