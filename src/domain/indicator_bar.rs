//! Augmented bars: a price bar joined with its swing, ATR and Fibonacci values.

use chrono::NaiveDate;

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::fibonacci::FibLevels;
use crate::domain::indicator::swing::{calculate_swing_high, calculate_swing_low};
use crate::domain::ohlcv::PriceBar;

/// Lookback windows for the indicator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub swing_period: usize,
    pub atr_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBar {
    pub bar: PriceBar,
    pub swing_high: f64,
    pub swing_low: f64,
    pub fib: FibLevels,
    pub atr: f64,
}

impl IndicatorBar {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    /// Strictly inside (swing_low, swing_high).
    pub fn within_swing_range(&self) -> bool {
        self.bar.close > self.swing_low && self.bar.close < self.swing_high
    }

    /// Strictly outside [swing_low, swing_high].
    pub fn outside_swing_range(&self) -> bool {
        self.bar.close < self.swing_low || self.bar.close > self.swing_high
    }
}

/// Run the indicator pass over one ticker's ordered bars.
///
/// Bars whose swing or ATR window is not yet full are dropped, so the output
/// may be shorter than the input (and empty for short histories).
pub fn derive_indicator_bars(bars: &[PriceBar], params: &IndicatorParams) -> Vec<IndicatorBar> {
    let swing_high = calculate_swing_high(bars, params.swing_period);
    let swing_low = calculate_swing_low(bars, params.swing_period);
    let atr = calculate_atr(bars, params.atr_period);

    bars.iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let high = swing_high.value_at(i)?;
            let low = swing_low.value_at(i)?;
            let atr = atr.value_at(i)?;
            Some(IndicatorBar {
                bar: bar.clone(),
                swing_high: high,
                swing_low: low,
                fib: FibLevels::from_swing(high, low),
                atr,
            })
        })
        .collect()
}
