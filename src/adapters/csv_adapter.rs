//! CSV file data adapter.
//!
//! Reads `<dir>/<TICKER>.csv` with columns
//! `date,open,high,low,close,adj_close,volume[,return]`, and writes the
//! indicator-augmented `processed_<TICKER>.csv` companion files.

use crate::domain::error::FibtraderError;
use crate::domain::indicator_bar::IndicatorBar;
use crate::domain::ohlcv::{PriceBar, fill_returns};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const NULL: &str = "NULL";

const PROCESSED_HEADER: [&str; 16] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "return",
    "swing_high",
    "swing_low",
    "fib_23_6",
    "fib_38_2",
    "fib_50",
    "fib_61_8",
    "fib_78_6",
    "atr",
];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    ticker: &str,
    line: u64,
) -> Result<&'r str, FibtraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| FibtraderError::data(ticker, format!("line {line}: missing {name} column")))
}

fn parse_f64(value: &str, name: &str, ticker: &str, line: u64) -> Result<f64, FibtraderError> {
    value.parse().map_err(|e| {
        FibtraderError::data(ticker, format!("line {line}: invalid {name} value '{value}': {e}"))
    })
}

/// Whole-number volume; a float-formatted integer such as `1200.0` is accepted.
fn parse_volume(value: &str, ticker: &str, line: u64) -> Result<i64, FibtraderError> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(FibtraderError::data(
            ticker,
            format!("line {line}: invalid volume value '{value}'"),
        )),
    }
}

/// A `NULL` or empty cell reads as absent.
fn parse_optional_f64(
    value: Option<&str>,
    name: &str,
    ticker: &str,
    line: u64,
) -> Result<Option<f64>, FibtraderError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case(NULL) => Ok(None),
        Some(v) => parse_f64(v, name, ticker, line).map(Some),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, FibtraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| {
            FibtraderError::data(ticker, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let has_return_column = rdr
            .headers()
            .map_err(|e| FibtraderError::data(ticker, format!("CSV header error: {}", e)))?
            .len()
            > 7;

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            // header is line 1
            let line = i as u64 + 2;
            let record = result
                .map_err(|e| FibtraderError::data(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = field(&record, 0, "date", ticker, line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                FibtraderError::data(ticker, format!("line {line}: invalid date '{date_str}': {e}"))
            })?;

            let mut prices = [0.0_f64; 5];
            for (slot, (index, name)) in prices.iter_mut().zip([
                (1, "open"),
                (2, "high"),
                (3, "low"),
                (4, "close"),
                (5, "adj_close"),
            ]) {
                *slot = parse_f64(field(&record, index, name, ticker, line)?, name, ticker, line)?;
            }
            let [open, high, low, close, adj_close] = prices;

            let volume = parse_volume(field(&record, 6, "volume", ticker, line)?, ticker, line)?;
            let daily_return = if has_return_column {
                parse_optional_f64(record.get(7), "return", ticker, line)?
            } else {
                None
            };

            rows.push((
                line,
                PriceBar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    adj_close,
                    volume,
                    daily_return,
                },
            ));
        }

        if rows.is_empty() {
            return Err(FibtraderError::EmptyInput {
                ticker: ticker.to_string(),
            });
        }

        rows.sort_by_key(|(_, b)| b.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].1.date == w[1].1.date) {
            let (first, second) = (pair[0].0.min(pair[1].0), pair[0].0.max(pair[1].0));
            let date = pair[1].1.date;
            return Err(FibtraderError::data(
                ticker,
                format!("line {second}: duplicate date {date} (first on line {first})"),
            ));
        }
        let mut bars: Vec<PriceBar> = rows.into_iter().map(|(_, b)| b).collect();
        if !has_return_column {
            fill_returns(&mut bars);
        }
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, FibtraderError> {
        let mut tickers = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(ticker) = name.strip_suffix(".csv") {
                if ticker.is_empty() || ticker.starts_with("processed_") {
                    continue;
                }
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// Write `bars` to `<dir>/processed_<ticker>.csv`, creating `dir` if needed.
///
/// Price columns keep full precision; indicator columns are rounded to two
/// decimals. An absent return is written as `NULL`.
pub fn write_processed(
    dir: &Path,
    ticker: &str,
    bars: &[IndicatorBar],
) -> Result<PathBuf, FibtraderError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("processed_{}.csv", ticker));
    let mut wtr = csv::Writer::from_path(&path)?;

    wtr.write_record(PROCESSED_HEADER)?;
    for b in bars {
        let p = &b.bar;
        wtr.write_record([
            p.date.format("%Y-%m-%d").to_string(),
            p.open.to_string(),
            p.high.to_string(),
            p.low.to_string(),
            p.close.to_string(),
            p.adj_close.to_string(),
            p.volume.to_string(),
            p.daily_return
                .map(|r| r.to_string())
                .unwrap_or_else(|| NULL.to_string()),
            format_value(b.swing_high),
            format_value(b.swing_low),
            format_value(b.fib.fib23_6),
            format_value(b.fib.fib38_2),
            format_value(b.fib.fib50),
            format_value(b.fib.fib61_8),
            format_value(b.fib.fib78_6),
            format_value(b.atr),
        ])?;
    }
    wtr.flush()?;
    Ok(path)
}
