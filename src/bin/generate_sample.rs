use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use parquet::arrow::ArrowWriter;

/// Station name with a pollution scale factor and a base SO2 level.
const STATIONS: [(&str, f64, f64); 12] = [
    ("Aotizhongxin", 1.05, 17.0),
    ("Changping", 0.85, 14.0),
    ("Dingling", 0.70, 11.0),
    ("Dongsi", 1.15, 18.0),
    ("Guanyuan", 1.10, 17.5),
    ("Gucheng", 1.12, 15.5),
    ("Huairou", 0.80, 12.0),
    ("Nongzhanguan", 1.08, 18.5),
    ("Shunyi", 0.95, 13.5),
    ("Tiantan", 1.02, 14.5),
    ("Wanliu", 1.06, 18.0),
    ("Wanshouxigong", 1.13, 17.0),
];

/// Share of pollutant cells left empty.
const MISSING_RATE: f64 = 0.02;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// A non-negative measurement, or `None` at `MISSING_RATE`.
    fn measurement(&mut self, mean: f64, std_dev: f64) -> Option<f64> {
        if self.next_f64() < MISSING_RATE {
            return None;
        }
        Some((self.gauss(mean, std_dev).max(0.0) * 10.0).round() / 10.0)
    }
}

/// Heating season (Nov–Mar) roughly doubles combustion pollutants.
fn seasonal_factor(t: NaiveDateTime) -> f64 {
    let day = t.and_utc().timestamp() as f64 / 86_400.0;
    1.0 + 0.6 * (2.0 * std::f64::consts::PI * (day - 15.0) / 365.25).cos()
}

/// Morning and evening traffic peaks.
fn diurnal_factor(t: NaiveDateTime) -> f64 {
    match t.hour() {
        7..=9 | 17..=20 => 1.25,
        0..=4 => 0.85,
        _ => 1.0,
    }
}

#[derive(Default)]
struct Columns {
    no: Vec<i64>,
    station: Vec<&'static str>,
    datetime: Vec<NaiveDateTime>,
    co: Vec<Option<f64>>,
    so2: Vec<Option<f64>>,
    pm10: Vec<Option<f64>>,
}

fn generate(start: NaiveDateTime, hours: i64, rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns::default();

    for &(station, scale, so2_base) in &STATIONS {
        // `No` restarts at 1 for every station, as in the per-station source files.
        for h in 0..hours {
            let t = start + Duration::hours(h);
            let level = scale * seasonal_factor(t) * diurnal_factor(t);

            cols.no.push(h + 1);
            cols.station.push(station);
            cols.datetime.push(t);
            cols.co.push(rng.measurement(1200.0 * level, 350.0));
            cols.so2.push(rng.measurement(so2_base * level, 5.0));
            cols.pm10.push(rng.measurement(105.0 * level, 35.0));
        }
    }

    cols
}

fn write_csv(path: &str, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(["No", "station", "datetime", "CO", "SO2", "PM10"])?;

    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for i in 0..cols.no.len() {
        writer.write_record([
            cols.no[i].to_string(),
            cols.station[i].to_string(),
            cols.datetime[i].format("%Y-%m-%d %H:%M:%S").to_string(),
            cell(cols.co[i]),
            cell(cols.so2[i]),
            cell(cols.pm10[i]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, cols: &Columns) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("No", DataType::Int64, false),
        Field::new("station", DataType::Utf8, false),
        Field::new("datetime", DataType::Timestamp(TimeUnit::Second, None), false),
        Field::new("CO", DataType::Float64, true),
        Field::new("SO2", DataType::Float64, true),
        Field::new("PM10", DataType::Float64, true),
    ]));

    let seconds: Vec<i64> = cols
        .datetime
        .iter()
        .map(|t| t.and_utc().timestamp())
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.no.clone())),
            Arc::new(StringArray::from(cols.station.clone())),
            Arc::new(TimestampSecondArray::from(seconds)),
            Arc::new(Float64Array::from(cols.co.clone())),
            Arc::new(Float64Array::from(cols.so2.clone())),
            Arc::new(Float64Array::from(cols.pm10.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // One year of hourly readings starting 2013-03-01.
    let start = NaiveDate::from_ymd_opt(2013, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let hours = 365 * 24;

    let cols = generate(start, hours, &mut rng);

    write_csv("sample_airquality.csv", &cols)?;
    write_parquet("sample_airquality.parquet", &cols)?;

    println!(
        "Wrote {} readings ({} stations × {hours} hours) to sample_airquality.csv / .parquet",
        cols.no.len(),
        STATIONS.len()
    );
    Ok(())
}
