//! Daily price bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
    /// Adjusted-close return versus the previous bar; `None` on the first bar.
    pub daily_return: Option<f64>,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Fill in `daily_return` from consecutive adjusted closes.
///
/// The first bar gets `None`; every later bar gets
/// `(adj_close[i] - adj_close[i-1]) / adj_close[i-1]`.
pub fn fill_returns(bars: &mut [PriceBar]) {
    let mut prev_adj: Option<f64> = None;
    for bar in bars.iter_mut() {
        bar.daily_return = prev_adj.map(|prev| (bar.adj_close - prev) / prev);
        prev_adj = Some(bar.adj_close);
    }
}
