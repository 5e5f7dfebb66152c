/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ReadingTable (sorted by datetime)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  DateRange → contiguous &[Reading]
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  monthly summary, station means
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  report   │  DashboardReport handed to the UI
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod report;
