//! Portfolio state: cash, share holdings and per-ticker allocation tracking.

use std::collections::{BTreeMap, HashMap};

/// Mutable portfolio owned by the simulation loop.
///
/// Per-ticker maps are `BTreeMap`s so that valuation sums run in ticker order
/// and reproduce bit-for-bit across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub peak_cash: f64,
    /// ticker → shares held (fractional)
    pub positions: BTreeMap<String, f64>,
    /// ticker → market value of the holding, re-marked at each day's close
    /// and moved by that day's buys and sells
    pub allocation_value: BTreeMap<String, f64>,
    /// ticker → static dollar cap
    pub allocation_cap: BTreeMap<String, f64>,
}

impl PortfolioState {
    pub fn new<I, S>(initial_balance: f64, tickers: I, cap_per_ticker: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut positions = BTreeMap::new();
        let mut allocation_value = BTreeMap::new();
        let mut allocation_cap = BTreeMap::new();
        for ticker in tickers {
            let ticker = ticker.into();
            positions.insert(ticker.clone(), 0.0);
            allocation_value.insert(ticker.clone(), 0.0);
            allocation_cap.insert(ticker, cap_per_ticker);
        }
        PortfolioState {
            cash: initial_balance,
            peak_cash: initial_balance,
            positions,
            allocation_value,
            allocation_cap,
        }
    }

    pub fn shares(&self, ticker: &str) -> f64 {
        self.positions.get(ticker).copied().unwrap_or(0.0)
    }

    pub fn allocation(&self, ticker: &str) -> f64 {
        self.allocation_value.get(ticker).copied().unwrap_or(0.0)
    }

    pub fn static_cap(&self, ticker: &str) -> f64 {
        self.allocation_cap.get(ticker).copied().unwrap_or(0.0)
    }

    /// cash + Σ shares × price, over tickers present in `price_map`.
    ///
    /// Holdings without a price (no bar on that date) contribute nothing.
    pub fn total_value(&self, price_map: &HashMap<&str, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .filter_map(|(ticker, &shares)| {
                price_map
                    .get(ticker.as_str())
                    .map(|&price| shares * price)
            })
            .sum();
        self.cash + position_value
    }

    /// Reset each priced ticker's allocation to shares × today's close.
    ///
    /// Tickers with no price on the day keep their previous allocation.
    pub fn mark_to_market(&mut self, price_map: &HashMap<&str, f64>) {
        for (ticker, allocation) in self.allocation_value.iter_mut() {
            if let Some(&price) = price_map.get(ticker.as_str()) {
                let shares = self.positions.get(ticker).copied().unwrap_or(0.0);
                *allocation = shares * price;
            }
        }
    }

    /// min(static cap, (portfolio value / ticker count) × max position fraction)
    pub fn dynamic_cap(
        &self,
        ticker: &str,
        total_portfolio_value: f64,
        num_tickers: usize,
        max_position_size: f64,
    ) -> f64 {
        let average_allocation = total_portfolio_value / num_tickers as f64;
        self.static_cap(ticker)
            .min(average_allocation * max_position_size)
    }

    /// Raise the cash high-water mark; never lowers it.
    pub fn update_peak(&mut self) {
        self.peak_cash = self.peak_cash.max(self.cash);
    }

    /// (cash - peak_cash) / peak_cash, always ≤ 0 once the peak is current.
    pub fn cash_drawdown(&self) -> f64 {
        if self.peak_cash > 0.0 {
            (self.cash - self.peak_cash) / self.peak_cash
        } else {
            0.0
        }
    }
}
