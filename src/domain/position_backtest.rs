//! Equal-weight backtest over a Long/Short/Neutral position ledger.
//!
//! On each date the portfolio return is the mean of the directional returns
//! of every ticker holding a non-Neutral position: `+r` for Long, `-r` for
//! Short. A day with no positions returns 0. The balance compounds by that
//! return and drawdown is measured against the balance high-water mark.
//! A position is scored against the return of its own row.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::backtest::DailyRecord;
use crate::domain::error::FibtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::Position;
use crate::domain::signal_table::PositionTable;

/// date → ticker → daily return, for every bar that has a return.
pub type ReturnGrid = BTreeMap<NaiveDate, BTreeMap<String, f64>>;

pub fn collect_returns<'a, I>(histories: I) -> ReturnGrid
where
    I: IntoIterator<Item = (&'a str, &'a [PriceBar])>,
{
    let mut grid = ReturnGrid::new();
    for (ticker, bars) in histories {
        for bar in bars {
            if let Some(r) = bar.daily_return {
                grid.entry(bar.date)
                    .or_default()
                    .insert(ticker.to_string(), r);
            }
        }
    }
    grid
}

#[derive(Debug, Clone)]
pub struct PositionBacktestResult {
    pub records: Vec<DailyRecord>,
    pub final_value: f64,
    pub total_signals: usize,
    pub correct_signals: usize,
    pub initial_balance: f64,
}

impl PositionBacktestResult {
    pub fn metrics(&self) -> Metrics {
        let returns: Vec<f64> = self.records.iter().map(|r| r.daily_return).collect();
        let drawdowns: Vec<f64> = self.records.iter().map(|r| r.drawdown).collect();
        Metrics::from_series(
            self.initial_balance,
            self.final_value,
            &returns,
            &drawdowns,
            self.total_signals,
            self.correct_signals,
        )
    }

    /// (date, balance - initial_balance) per date.
    pub fn pnl_series(&self) -> Vec<(NaiveDate, f64)> {
        self.records
            .iter()
            .map(|r| (r.date, r.total_value - self.initial_balance))
            .collect()
    }
}

/// Fails with [`FibtraderError::EmptyTimeline`] when no ticker has a return.
pub fn run_position_backtest(
    returns: &ReturnGrid,
    positions: &PositionTable,
    initial_balance: f64,
) -> Result<PositionBacktestResult, FibtraderError> {
    if returns.is_empty() {
        return Err(FibtraderError::EmptyTimeline);
    }

    let mut balance = initial_balance;
    let mut peak = initial_balance;
    let mut total_signals = 0;
    let mut correct_signals = 0;
    let mut records = Vec::with_capacity(returns.len());

    for (&date, day) in returns {
        let mut sum = 0.0;
        let mut active = 0usize;

        for (ticker, &r) in day {
            let position = positions.get(date, ticker).unwrap_or(Position::Neutral);
            if position == Position::Neutral {
                continue;
            }
            active += 1;
            if position.direction() * r > 0.0 {
                correct_signals += 1;
            }
            sum += position.direction() * r;
        }
        total_signals += active;

        let daily_return = sum / active.max(1) as f64;
        balance += balance * daily_return;
        peak = peak.max(balance);
        let drawdown = if peak > 0.0 { (balance - peak) / peak } else { 0.0 };

        records.push(DailyRecord {
            date,
            total_value: balance,
            daily_return,
            drawdown,
        });
    }

    log::info!(
        "simulated {} days, {} positions taken",
        records.len(),
        total_signals
    );

    Ok(PositionBacktestResult {
        records,
        final_value: balance,
        total_signals,
        correct_signals,
        initial_balance,
    })
}
