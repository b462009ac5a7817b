//! Ticker universe: parsing ticker lists and loading per-ticker price and
//! indicator data.
//!
//! A ticker whose source data is malformed is dropped with a warning; the run
//! continues with the rest. Only when nothing loads does the run fail.

use crate::domain::error::FibtraderError;
use crate::domain::indicator_bar::{IndicatorParams, derive_indicator_bars};
use crate::domain::ohlcv::{PriceBar, fill_returns};
use crate::domain::ticker_data::TickerData;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        // Tickers name data files, so case is kept as given.
        let ticker = trimmed.to_string();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct Universe {
    pub tickers: Vec<TickerData>,
    pub skipped: Vec<SkippedTicker>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.tickers.len()
    }
}

#[derive(Debug)]
pub struct PriceHistory {
    pub ticker: String,
    /// Date-ordered, with `daily_return` filled from adjusted close.
    pub bars: Vec<PriceBar>,
}

#[derive(Debug)]
pub struct LoadedHistories {
    pub histories: Vec<PriceHistory>,
    pub skipped: Vec<SkippedTicker>,
}

/// Fetch every ticker's bars, in the order given.
pub fn load_price_history(
    data_port: &dyn DataPort,
    tickers: &[String],
) -> Result<LoadedHistories, FibtraderError> {
    let mut histories = Vec::with_capacity(tickers.len());
    let mut skipped = Vec::new();

    for ticker in tickers {
        let mut bars = match data_port.fetch_bars(ticker) {
            Ok(bars) => bars,
            Err(e) if e.is_data_error() => {
                log::warn!("skipping {} ({})", ticker, e);
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        fill_returns(&mut bars);
        histories.push(PriceHistory {
            ticker: ticker.clone(),
            bars,
        });
    }

    if histories.is_empty() {
        return Err(FibtraderError::NoTickers);
    }

    if !skipped.is_empty() {
        log::info!(
            "loaded {} of {} tickers",
            histories.len(),
            histories.len() + skipped.len()
        );
    }

    Ok(LoadedHistories { histories, skipped })
}

/// Fetch every ticker and run the indicator pass over it.
///
/// Tickers are kept in the order given. A ticker whose history is too short
/// for the indicator windows is kept with no rows; it still counts toward the
/// per-ticker allocation split.
pub fn load_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
    params: &IndicatorParams,
) -> Result<Universe, FibtraderError> {
    let LoadedHistories { histories, skipped } = load_price_history(data_port, tickers)?;

    let loaded = histories
        .into_iter()
        .map(|PriceHistory { ticker, bars }| {
            let indicator_bars = derive_indicator_bars(&bars, params);
            if indicator_bars.is_empty() {
                log::warn!(
                    "{}: {} bars, none past the swing({})/ATR({}) windows",
                    ticker,
                    bars.len(),
                    params.swing_period,
                    params.atr_period
                );
            } else {
                log::info!(
                    "{}: {} bars, {} with indicators",
                    ticker,
                    bars.len(),
                    indicator_bars.len()
                );
            }
            TickerData::new(ticker, indicator_bars)
        })
        .collect();

    Ok(Universe {
        tickers: loaded,
        skipped,
    })
}
