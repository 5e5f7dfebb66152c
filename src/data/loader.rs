use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Reading, ReadingTable};
use crate::error::DashError;

/// Columns every input file must carry. Others are ignored.
pub const REQUIRED_COLUMNS: [&str; 6] = ["No", "station", "datetime", "CO", "SO2", "PM10"];

/// Text cells treated as a missing measurement.
const MISSING_MARKERS: [&str; 5] = ["NA", "NaN", "nan", "null", "None"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a reading table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least the [`REQUIRED_COLUMNS`]
/// * `.json`    – `[{ "No": 1, "station": "...", "datetime": "...", ... }, ...]`
/// * `.parquet` – flat columns; `datetime` may be text or a timestamp
///
/// Rows come back sorted by `datetime`. Row numbers in errors are 1-based
/// and exclude the header.
pub fn load_file(path: &Path) -> Result<ReadingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let readings = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => return Err(DashError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    let table = ReadingTable::from_readings(readings);
    log::info!(
        "Loaded {} readings from {} stations ({})",
        table.len(),
        table.stations().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Cell parsing shared by all formats
// ---------------------------------------------------------------------------

/// Parse a `datetime` cell.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS[.fff]]` with a space or `T` separator,
/// RFC 3339 with an offset (wall-clock time is kept), and a bare date,
/// which maps to midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Look up every [`REQUIRED_COLUMNS`] entry, in order, with `find`.
fn required<T>(mut find: impl FnMut(&str) -> Option<T>) -> Result<[T; 6]> {
    let found = REQUIRED_COLUMNS
        .iter()
        .map(|&name| {
            find(name).ok_or_else(|| anyhow::Error::from(DashError::MissingColumn(name.to_string())))
        })
        .collect::<Result<Vec<T>>>()?;
    <[T; 6]>::try_from(found).map_err(|_| anyhow::anyhow!("column lookup lost a column"))
}

fn require_datetime(s: &str, row: usize) -> Result<NaiveDateTime> {
    parse_datetime(s).ok_or_else(|| {
        DashError::DatetimeParse {
            row,
            value: s.to_string(),
        }
        .into()
    })
}

/// Parse a pollutant cell. Blank cells and the usual NA spellings are `None`.
fn parse_measurement(s: &str, row: usize, col: &str) -> Result<Option<f64>> {
    let s = s.trim();
    if s.is_empty() || MISSING_MARKERS.contains(&s) {
        return Ok(None);
    }
    let v: f64 = s
        .parse()
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))?;
    Ok(v.is_finite().then_some(v))
}

/// Parse a `No` cell. Integral floats such as `12.0` are accepted.
fn parse_entry_no(s: &str, row: usize) -> Result<Option<i64>> {
    let s = s.trim();
    if s.is_empty() || MISSING_MARKERS.contains(&s) {
        return Ok(None);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Some(i));
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
        _ => bail!("Row {row}, No: '{s}' is not an integer"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one reading per record.
fn load_csv(path: &Path) -> Result<Vec<Reading>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let [no_idx, station_idx, dt_idx, co_idx, so2_idx, pm10_idx] =
        required(|name| headers.iter().position(|h| h.trim() == name))?;

    let mut readings = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.with_context(|| format!("CSV row {row}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        readings.push(Reading {
            no: parse_entry_no(cell(no_idx), row)?,
            station: cell(station_idx).trim().to_string(),
            datetime: require_datetime(cell(dt_idx), row)?,
            co: parse_measurement(cell(co_idx), row, "CO")?,
            so2: parse_measurement(cell(so2_idx), row, "SO2")?,
            pm10: parse_measurement(cell(pm10_idx), row, "PM10")?,
        });
    }

    Ok(readings)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as written by
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "No": 1, "station": "Dongsi", "datetime": "2013-03-01T00:00:00",
///     "CO": 300.0, "SO2": 4.0, "PM10": null },
///   ...
/// ]
/// ```
///
/// `datetime` may also be an integer of epoch milliseconds, the pandas
/// default when `date_format` is not `'iso'`.
fn load_json(path: &Path) -> Result<Vec<Reading>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut readings = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let row = i + 1;
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {row} is not a JSON object"))?;

        let [no, station, datetime, co, so2, pm10] = required(|name| obj.get(name))?;

        let station = match station {
            JsonValue::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };

        readings.push(Reading {
            no: json_entry_no(no, row)?,
            station,
            datetime: json_datetime(datetime, row)?,
            co: json_measurement(co, row, "CO")?,
            so2: json_measurement(so2, row, "SO2")?,
            pm10: json_measurement(pm10, row, "PM10")?,
        });
    }

    Ok(readings)
}

fn json_datetime(val: &JsonValue, row: usize) -> Result<NaiveDateTime> {
    match val {
        JsonValue::String(s) => require_datetime(s, row),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| {
                DashError::DatetimeParse {
                    row,
                    value: format!("{n} (expected integer epoch milliseconds)"),
                }
                .into()
            }),
        other => Err(DashError::DatetimeParse {
            row,
            value: other.to_string(),
        }
        .into()),
    }
}

fn json_measurement(val: &JsonValue, row: usize, col: &str) -> Result<Option<f64>> {
    match val {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => Ok(n.as_f64().filter(|v| v.is_finite())),
        JsonValue::String(s) => parse_measurement(s, row, col),
        other => bail!("Row {row}, {col}: unexpected value {other}"),
    }
}

fn json_entry_no(val: &JsonValue, row: usize) -> Result<Option<i64>> {
    match val {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => parse_entry_no(&n.to_string(), row),
        },
        JsonValue::String(s) => parse_entry_no(s, row),
        other => bail!("Row {row}, No: unexpected value {other}"),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of readings.
///
/// Numeric columns may be any integer or float type; they are cast to
/// `Int64` / `Float64`. `datetime` may be a string column or an Arrow
/// timestamp/date column. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Reading>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut readings = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let [no, station, datetime, co, so2, pm10] = required(|name| {
            schema
                .index_of(name)
                .ok()
                .map(|idx| batch.column(idx).clone())
        })?;

        let no = entry_no_column(&no, readings.len())?;
        let station = cast(&station, &DataType::Utf8).context("casting 'station'")?;
        let datetime = DatetimeColumn::new(&datetime)?;
        let co = float_column(&co, "CO")?;
        let so2 = float_column(&so2, "SO2")?;
        let pm10 = float_column(&pm10, "PM10")?;

        let no = no.as_primitive::<Int64Type>();
        let station = station.as_string::<i32>();

        for i in 0..batch.num_rows() {
            let row = readings.len() + 1;
            readings.push(Reading {
                no: (!no.is_null(i)).then(|| no.value(i)),
                station: if station.is_null(i) {
                    String::new()
                } else {
                    station.value(i).trim().to_string()
                },
                datetime: datetime.get(i, row)?,
                co: float_at(&co, i),
                so2: float_at(&so2, i),
                pm10: float_at(&pm10, i),
            });
        }
    }

    Ok(readings)
}

// -- Parquet / Arrow helpers --

/// Cast `No` to `Int64`, rejecting fractional floats instead of truncating.
///
/// `rows_before` is the number of rows in earlier batches, for error rows.
fn entry_no_column(col: &ArrayRef, rows_before: usize) -> Result<ArrayRef> {
    if col.data_type().is_floating() {
        let floats = float_column(col, "No")?;
        let floats = floats.as_primitive::<Float64Type>();
        for i in 0..floats.len() {
            if floats.is_null(i) {
                continue;
            }
            let v = floats.value(i);
            if !v.is_finite() || v.fract() != 0.0 {
                bail!("Row {}, No: '{v}' is not an integer", rows_before + i + 1);
            }
        }
    }
    cast(col, &DataType::Int64).context("casting 'No' to Int64")
}

fn float_column(col: &ArrayRef, name: &str) -> Result<ArrayRef> {
    cast(col, &DataType::Float64).with_context(|| format!("casting '{name}' to Float64"))
}

fn float_at(col: &ArrayRef, i: usize) -> Option<f64> {
    let arr = col.as_primitive::<Float64Type>();
    if arr.is_null(i) {
        return None;
    }
    Some(arr.value(i)).filter(|v| v.is_finite())
}

/// A `datetime` column normalised to either microsecond timestamps or text.
enum DatetimeColumn {
    Timestamp(ArrayRef),
    Text(ArrayRef),
}

impl DatetimeColumn {
    fn new(col: &ArrayRef) -> Result<Self> {
        match col.data_type() {
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
                let ts = cast(col, &DataType::Timestamp(TimeUnit::Microsecond, None))
                    .context("casting 'datetime' to timestamp")?;
                Ok(DatetimeColumn::Timestamp(ts))
            }
            DataType::Utf8 | DataType::LargeUtf8 => {
                let text = cast(col, &DataType::Utf8).context("casting 'datetime' to text")?;
                Ok(DatetimeColumn::Text(text))
            }
            other => bail!("Column 'datetime' has unsupported type {other:?}"),
        }
    }

    fn get(&self, i: usize, row: usize) -> Result<NaiveDateTime> {
        match self {
            DatetimeColumn::Timestamp(arr) => {
                let arr = arr.as_primitive::<TimestampMicrosecondType>();
                if arr.is_null(i) {
                    return Err(null_datetime(row));
                }
                arr.value_as_datetime(i).ok_or_else(|| {
                    DashError::DatetimeParse {
                        row,
                        value: arr.value(i).to_string(),
                    }
                    .into()
                })
            }
            DatetimeColumn::Text(arr) => {
                let arr = arr.as_string::<i32>();
                if arr.is_null(i) {
                    return Err(null_datetime(row));
                }
                require_datetime(arr.value(i), row)
            }
        }
    }
}

fn null_datetime(row: usize) -> anyhow::Error {
    DashError::DatetimeParse {
        row,
        value: "<null>".to_string(),
    }
    .into()
}
