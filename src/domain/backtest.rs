//! Portfolio simulation over the unified timeline.
//!
//! [`Simulation`] advances one date per [`Simulation::step`]. Each day it
//! marks the book to market, derives every ticker's dynamic cap and
//! available room, evaluates and executes signals in ticker order, then
//! appends a [`DailyRecord`]. [`run_backtest`] drives a simulation to the end.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::error::FibtraderError;
use crate::domain::execution::{BuyResult, SellResult, execute_buy, execute_sell};
use crate::domain::portfolio::PortfolioState;
use crate::domain::signal::{SignalContext, SignalKind, evaluate_signal};
use crate::domain::signal_table::SignalTable;
use crate::domain::ticker_data::TickerData;

/// Strategy and sizing parameters, all taken from the `[backtest]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    pub buy_full_below: f64,
    pub buy_half_above: f64,
    pub sell_full_above: f64,
    pub sell_half_above: f64,
    pub atr_volatility_threshold: f64,
    /// Accepted for config compatibility; no stop-loss is applied.
    pub stop_loss_percent: f64,
    pub max_position_size: f64,
}

impl BacktestConfig {
    /// initial_balance / (num_tickers × 2)
    pub fn base_allocation_per_ticker(&self, num_tickers: usize) -> f64 {
        self.initial_balance / (num_tickers as f64 * 2.0)
    }
}

/// One simulated day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub total_value: f64,
    pub daily_return: f64,
    /// Drawdown against the run's high-water mark (cash for the Fibonacci
    /// engine, balance for the position backtest).
    pub drawdown: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub records: Vec<DailyRecord>,
    pub portfolio: PortfolioState,
    pub final_value: f64,
    pub total_signals: usize,
    pub correct_signals: usize,
    pub initial_balance: f64,
}

impl BacktestResult {
    pub fn daily_returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.daily_return).collect()
    }

    pub fn drawdowns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.drawdown).collect()
    }

    /// (date, total_value - initial_balance) per simulated day.
    pub fn pnl_series(&self) -> Vec<(NaiveDate, f64)> {
        self.records
            .iter()
            .map(|r| (r.date, r.total_value - self.initial_balance))
            .collect()
    }
}

/// Everything needed to continue a simulation from the next unprocessed date.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationCheckpoint {
    pub portfolio: PortfolioState,
    pub next_index: usize,
    pub previous_total_value: f64,
    pub total_signals: usize,
    pub correct_signals: usize,
    pub records: Vec<DailyRecord>,
}

fn sorted_by_ticker(tickers: &[TickerData]) -> Vec<&TickerData> {
    let mut sorted: Vec<&TickerData> = tickers.iter().collect();
    sorted.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    sorted
}

pub struct Simulation<'a> {
    /// Sorted by ticker so per-day trades and sums run in a fixed order.
    tickers: Vec<&'a TickerData>,
    timeline: &'a [NaiveDate],
    config: &'a BacktestConfig,
    base_allocation: f64,
    portfolio: PortfolioState,
    next_index: usize,
    previous_total_value: f64,
    total_signals: usize,
    correct_signals: usize,
    records: Vec<DailyRecord>,
}

impl<'a> Simulation<'a> {
    pub fn new(
        tickers: &'a [TickerData],
        timeline: &'a [NaiveDate],
        config: &'a BacktestConfig,
    ) -> Result<Self, FibtraderError> {
        Self::check_inputs(tickers, timeline)?;
        let base_allocation = config.base_allocation_per_ticker(tickers.len());
        let portfolio = PortfolioState::new(
            config.initial_balance,
            tickers.iter().map(|td| td.ticker.as_str()),
            base_allocation,
        );
        Ok(Self {
            tickers: sorted_by_ticker(tickers),
            timeline,
            config,
            base_allocation,
            portfolio,
            next_index: 0,
            previous_total_value: config.initial_balance,
            total_signals: 0,
            correct_signals: 0,
            records: Vec::with_capacity(timeline.len()),
        })
    }

    /// Continue from `checkpoint` over the same tickers and timeline.
    pub fn resume(
        tickers: &'a [TickerData],
        timeline: &'a [NaiveDate],
        config: &'a BacktestConfig,
        checkpoint: SimulationCheckpoint,
    ) -> Result<Self, FibtraderError> {
        Self::check_inputs(tickers, timeline)?;
        if checkpoint.next_index > timeline.len() {
            return Err(FibtraderError::ConfigInvalid {
                section: "checkpoint".into(),
                key: "next_index".into(),
                reason: format!(
                    "{} is past the end of a {}-day timeline",
                    checkpoint.next_index,
                    timeline.len()
                ),
            });
        }
        Ok(Self {
            tickers: sorted_by_ticker(tickers),
            timeline,
            config,
            base_allocation: config.base_allocation_per_ticker(tickers.len()),
            portfolio: checkpoint.portfolio,
            next_index: checkpoint.next_index,
            previous_total_value: checkpoint.previous_total_value,
            total_signals: checkpoint.total_signals,
            correct_signals: checkpoint.correct_signals,
            records: checkpoint.records,
        })
    }

    fn check_inputs(tickers: &[TickerData], timeline: &[NaiveDate]) -> Result<(), FibtraderError> {
        if tickers.is_empty() {
            return Err(FibtraderError::NoTickers);
        }
        if timeline.is_empty() {
            return Err(FibtraderError::EmptyTimeline);
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.next_index >= self.timeline.len()
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn checkpoint(&self) -> SimulationCheckpoint {
        SimulationCheckpoint {
            portfolio: self.portfolio.clone(),
            next_index: self.next_index,
            previous_total_value: self.previous_total_value,
            total_signals: self.total_signals,
            correct_signals: self.correct_signals,
            records: self.records.clone(),
        }
    }

    /// Close prices for every ticker with a row on `date`.
    fn price_map(&self, date: NaiveDate) -> HashMap<&'a str, f64> {
        self.tickers
            .iter()
            .copied()
            .filter_map(|td| td.get_bar(date).map(|bar| (td.ticker.as_str(), bar.close())))
            .collect()
    }

    /// Simulate the next date. Returns `None` once the timeline is exhausted.
    ///
    /// Every evaluated signal, Hold included, is merged into `ledger`.
    pub fn step(&mut self, ledger: &mut SignalTable) -> Option<&DailyRecord> {
        let date = *self.timeline.get(self.next_index)?;
        let num_tickers = self.tickers.len();

        let prices = self.price_map(date);
        let opening_value = self.portfolio.total_value(&prices);
        self.portfolio.mark_to_market(&prices);

        for &td in &self.tickers {
            let Some((previous, current)) = td.bar_with_previous(date) else {
                continue;
            };
            let ticker = td.ticker.as_str();
            let dynamic_cap = self.portfolio.dynamic_cap(
                ticker,
                opening_value,
                num_tickers,
                self.config.max_position_size,
            );
            let ctx = SignalContext {
                previous,
                current,
                available_room: dynamic_cap - self.portfolio.allocation(ticker),
                position_shares: self.portfolio.shares(ticker),
                base_allocation: self.base_allocation,
                config: self.config,
            };
            let signal = evaluate_signal(ticker, &ctx);
            ledger.merge(&signal);

            let correct = match signal.kind {
                SignalKind::Buy => match execute_buy(
                    &mut self.portfolio,
                    ticker,
                    current,
                    signal.requested_amount,
                    dynamic_cap,
                ) {
                    BuyResult::Executed {
                        shares,
                        cost,
                        correct,
                    } => {
                        log::debug!(
                            "{} BUY {}: {:.4} shares at {:.2} for {:.2}",
                            date,
                            ticker,
                            shares,
                            current.close(),
                            cost
                        );
                        Some(correct)
                    }
                    rejected => {
                        log::debug!("{} BUY {} not executed: {:?}", date, ticker, rejected);
                        None
                    }
                },
                SignalKind::Sell => match execute_sell(
                    &mut self.portfolio,
                    ticker,
                    current,
                    signal.requested_amount,
                ) {
                    SellResult::Executed {
                        shares,
                        proceeds,
                        correct,
                    } => {
                        log::debug!(
                            "{} SELL {}: {:.4} shares at {:.2} for {:.2}",
                            date,
                            ticker,
                            shares,
                            current.close(),
                            proceeds
                        );
                        Some(correct)
                    }
                    SellResult::NoPosition => None,
                },
                SignalKind::Hold => None,
            };

            if let Some(correct) = correct {
                self.total_signals += 1;
                if correct {
                    self.correct_signals += 1;
                }
            }
        }

        let total_value = self.portfolio.total_value(&prices);
        let daily_return = (total_value - self.previous_total_value) / self.previous_total_value;
        self.previous_total_value = total_value;

        self.portfolio.update_peak();
        let drawdown = self.portfolio.cash_drawdown();

        self.records.push(DailyRecord {
            date,
            total_value,
            daily_return,
            drawdown,
        });
        self.next_index += 1;
        self.records.last()
    }

    /// Value open positions at each ticker's last close; nothing is sold.
    pub fn finish(self) -> BacktestResult {
        let position_value: f64 = self
            .tickers
            .iter()
            .filter_map(|td| {
                let shares = self.portfolio.shares(&td.ticker);
                td.last_bar().map(|bar| shares * bar.close())
            })
            .sum();
        let final_value = self.portfolio.cash + position_value;

        BacktestResult {
            records: self.records,
            portfolio: self.portfolio,
            final_value,
            total_signals: self.total_signals,
            correct_signals: self.correct_signals,
            initial_balance: self.config.initial_balance,
        }
    }
}

/// Run a full simulation over `timeline`.
///
/// Fails with [`FibtraderError::NoTickers`] or
/// [`FibtraderError::EmptyTimeline`] before any day is simulated.
pub fn run_backtest(
    tickers: &[TickerData],
    timeline: &[NaiveDate],
    config: &BacktestConfig,
    ledger: &mut SignalTable,
) -> Result<BacktestResult, FibtraderError> {
    let mut sim = Simulation::new(tickers, timeline, config)?;
    while sim.step(ledger).is_some() {}
    let result = sim.finish();
    log::info!(
        "simulated {} days, {} signals executed",
        result.records.len(),
        result.total_signals
    );
    Ok(result)
}
