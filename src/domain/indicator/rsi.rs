//! Windowed RSI (Relative Strength Index) over adjusted close.
//!
//! For bar i the window holds the price changes ending at i whose previous
//! bar exists: Δ[j] = X[j] - X[j-1] for j in max(1, i-n+1)..=i.
//!
//! - avg_gain: mean of the positive changes only (0 if there are none)
//! - avg_loss: mean of |negative changes| only (0 if there are none)
//! - RSI = 100 - 100 / (1 + avg_gain / avg_loss), or 100 when avg_loss == 0
//!
//! No smoothing carries between bars. Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            IndicatorPoint {
                date: bar.date,
                valid,
                value: if valid { window_rsi(bars, i, period) } else { 0.0 },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn window_rsi(bars: &[PriceBar], end: usize, period: usize) -> f64 {
    let start = (end + 1 - period).max(1);
    let changes: Vec<f64> = (start..=end)
        .map(|j| bars[j].adj_close - bars[j - 1].adj_close)
        .collect();

    let avg_gain = mean(changes.iter().copied().filter(|&c| c > 0.0));
    let avg_loss = mean(changes.iter().filter(|&&c| c < 0.0).map(|c| c.abs()));

    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
