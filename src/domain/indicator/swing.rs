//! Swing high / swing low indicators.
//!
//! SWING_HIGH(n)[i] = max(H[i-n+1..=i]), SWING_LOW(n)[i] = min(L[i-n+1..=i]).
//! Warmup: first (n-1) bars are invalid. A period of 0 yields no valid points.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_swing_high(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::SwingHigh(period),
        values: rolling_extreme(bars, period, |b| b.high, f64::max),
    }
}

pub fn calculate_swing_low(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::SwingLow(period),
        values: rolling_extreme(bars, period, |b| b.low, f64::min),
    }
}

fn rolling_extreme(
    bars: &[PriceBar],
    period: usize,
    field: impl Fn(&PriceBar) -> f64,
    pick: impl Fn(f64, f64) -> f64,
) -> Vec<IndicatorPoint> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let value = if valid {
                bars[i + 1 - period..=i]
                    .iter()
                    .map(&field)
                    .reduce(&pick)
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            IndicatorPoint {
                date: bar.date,
                valid,
                value,
            }
        })
        .collect()
}
