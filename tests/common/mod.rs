#![allow(dead_code)]

use chrono::NaiveDate;
use fibtrader::domain::backtest::BacktestConfig;
use fibtrader::domain::error::FibtraderError;
use fibtrader::domain::indicator_bar::IndicatorParams;
use fibtrader::domain::metrics::Metrics;
pub use fibtrader::domain::ohlcv::PriceBar;
use fibtrader::ports::data_port::DataPort;
use fibtrader::ports::report_port::ReportPort;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, FibtraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(FibtraderError::DataParse {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        self.data
            .get(ticker)
            .cloned()
            .ok_or_else(|| FibtraderError::EmptyInput {
                ticker: ticker.to_string(),
            })
    }

    fn list_tickers(&self) -> Result<Vec<String>, FibtraderError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Captures what a run reports instead of printing it.
#[derive(Debug, Default)]
pub struct RecordingReport {
    pub metrics: Option<Metrics>,
    pub pnl: Vec<(NaiveDate, f64)>,
}

impl ReportPort for RecordingReport {
    fn write_metrics(&mut self, metrics: &Metrics) -> Result<(), FibtraderError> {
        self.metrics = Some(metrics.clone());
        Ok(())
    }

    fn write_pnl_series(&mut self, series: &[(NaiveDate, f64)]) -> Result<(), FibtraderError> {
        self.pnl = series.to_vec();
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, high: f64, low: f64, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high,
        low,
        close,
        adj_close: close,
        volume: 1000,
        daily_return: None,
    }
}

/// Daily bars from `closes`, each with a ±0.5 high/low band.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + chrono::Duration::days(i as i64), c + 0.5, c - 0.5, c))
        .collect()
}

/// A path that rallies to 110, retraces to the low 100s and recovers, so the
/// swing window sees crossings of every Fibonacci level in both directions.
pub fn retracement_closes() -> Vec<f64> {
    vec![
        100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 109.0, 107.0, 105.0, 103.5, 102.0, 101.0,
        102.5, 104.0, 106.0, 108.0, 107.0, 104.5, 103.0, 105.0, 107.5,
    ]
}

pub fn sample_params() -> IndicatorParams {
    IndicatorParams {
        swing_period: 5,
        atr_period: 3,
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_balance: 100_000.0,
        buy_full_below: 0.5,
        buy_half_above: 0.25,
        sell_full_above: 0.2,
        sell_half_above: 0.1,
        atr_volatility_threshold: 0.2,
        stop_loss_percent: 0.02,
        max_position_size: 0.5,
    }
}

pub const VALID_INI_BODY: &str = r#"
[indicators]
swing_period = 5
atr_period = 3

[backtest]
initial_balance = 100000
buy_full_below = 0.5
buy_half_above = 0.25
sell_full_above = 0.2
sell_half_above = 0.1
atr_volatility_threshold = 0.2
stop_loss_percent = 0.02
max_position_size = 0.5
"#;

/// Write `bars` as `<dir>/<ticker>.csv` without a returns column.
pub fn write_ticker_csv(dir: &Path, ticker: &str, bars: &[PriceBar]) {
    let mut content = String::from("date,open,high,low,close,adj_close,volume\n");
    for b in bars {
        writeln!(
            content,
            "{},{},{},{},{},{},{}",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.adj_close,
            b.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}

pub const POSITIONS_INI_SECTION: &str = r#"
[positions]
strategy = sma_crossover
short_window = 2
long_window = 5
initial_balance = 100000
"#;
