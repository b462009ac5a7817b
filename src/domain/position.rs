//! Trend-following position strategies.
//!
//! Each strategy maps a ticker's bar history to one [`Position`] per bar.
//! Bars still inside any indicator warmup are `Neutral`.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal_table::{LedgerCell, PositionTable};

/// RSI must be above this for a confirmed Long.
pub const RSI_LONG_FLOOR: f64 = 40.0;
/// RSI must be below this for a confirmed Short.
pub const RSI_SHORT_CEILING: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Long,
    Short,
    Neutral,
}

impl Position {
    /// +1 for Long, -1 for Short, 0 for Neutral.
    pub fn direction(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
            Position::Neutral => 0.0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Long => write!(f, "Long"),
            Position::Short => write!(f, "Short"),
            Position::Neutral => write!(f, "Neutral"),
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(Position::Long),
            "short" => Ok(Position::Short),
            "neutral" | "" => Ok(Position::Neutral),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

impl LedgerCell for Position {
    const EMPTY: Self = Position::Neutral;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingAverage {
    Simple,
    Exponential,
}

impl MovingAverage {
    fn series(self, bars: &[PriceBar], period: usize) -> IndicatorSeries {
        match self {
            MovingAverage::Simple => calculate_sma(bars, period),
            MovingAverage::Exponential => calculate_ema(bars, period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionStrategy {
    /// Long while the short average is above the long one, Short while below.
    Crossover {
        average: MovingAverage,
        short_window: usize,
        long_window: usize,
    },
    /// Crossover direction confirmed by RSI and above-average volume;
    /// Neutral when either confirmation fails.
    Confirmed {
        average: MovingAverage,
        short_window: usize,
        long_window: usize,
        rsi_window: usize,
        volume_window: usize,
    },
}

impl PositionStrategy {
    /// The `[positions] strategy` name this strategy is configured by.
    pub fn name(&self) -> &'static str {
        match self {
            PositionStrategy::Crossover {
                average: MovingAverage::Simple,
                ..
            } => "sma_crossover",
            PositionStrategy::Crossover {
                average: MovingAverage::Exponential,
                ..
            } => "ema_crossover",
            PositionStrategy::Confirmed {
                average: MovingAverage::Simple,
                ..
            } => "sma_rsi_volume",
            PositionStrategy::Confirmed {
                average: MovingAverage::Exponential,
                ..
            } => "ema_rsi_volume",
        }
    }
}

impl fmt::Display for PositionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStrategy::Crossover {
                short_window,
                long_window,
                ..
            } => write!(f, "{}({}/{})", self.name(), short_window, long_window),
            PositionStrategy::Confirmed {
                short_window,
                long_window,
                rsi_window,
                volume_window,
                ..
            } => write!(
                f,
                "{}({}/{}, rsi {}, volume {})",
                self.name(),
                short_window,
                long_window,
                rsi_window,
                volume_window
            ),
        }
    }
}

/// One position per bar, in bar order.
pub fn generate_positions(
    bars: &[PriceBar],
    strategy: &PositionStrategy,
) -> Vec<(NaiveDate, Position)> {
    match *strategy {
        PositionStrategy::Crossover {
            average,
            short_window,
            long_window,
        } => {
            let short = average.series(bars, short_window);
            let long = average.series(bars, long_window);
            bars.iter()
                .enumerate()
                .map(|(i, bar)| {
                    let position = match (short.value_at(i), long.value_at(i)) {
                        (Some(s), Some(l)) => trend(s, l),
                        _ => Position::Neutral,
                    };
                    (bar.date, position)
                })
                .collect()
        }
        PositionStrategy::Confirmed {
            average,
            short_window,
            long_window,
            rsi_window,
            volume_window,
        } => {
            let short = average.series(bars, short_window);
            let long = average.series(bars, long_window);
            let rsi = calculate_rsi(bars, rsi_window);
            let avg_volume = calculate_volume_sma(bars, volume_window);
            bars.iter()
                .enumerate()
                .map(|(i, bar)| {
                    let position = match (
                        short.value_at(i),
                        long.value_at(i),
                        rsi.value_at(i),
                        avg_volume.value_at(i),
                    ) {
                        (Some(s), Some(l), Some(r), Some(v)) => {
                            confirmed(trend(s, l), r, bar.volume as f64 > v)
                        }
                        _ => Position::Neutral,
                    };
                    (bar.date, position)
                })
                .collect()
        }
    }
}

fn trend(short: f64, long: f64) -> Position {
    if short > long {
        Position::Long
    } else if short < long {
        Position::Short
    } else {
        Position::Neutral
    }
}

fn confirmed(trend: Position, rsi: f64, heavy_volume: bool) -> Position {
    match trend {
        Position::Long if heavy_volume && rsi > RSI_LONG_FLOOR => Position::Long,
        Position::Short if heavy_volume && rsi < RSI_SHORT_CEILING => Position::Short,
        _ => Position::Neutral,
    }
}

/// Write `ticker`'s positions into `ledger`, replacing its earlier cells on
/// the same dates and leaving other tickers untouched.
pub fn record_positions(
    ledger: &mut PositionTable,
    ticker: &str,
    positions: &[(NaiveDate, Position)],
) {
    for &(date, position) in positions {
        ledger.insert(date, ticker, position);
    }
}
