//! Simple moving averages of adjusted close and of volume.
//!
//! SMA(n)[i] = mean(X[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: rolling_mean(bars, period, |b| b.adj_close),
    }
}

pub fn calculate_volume_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values: rolling_mean(bars, period, |b| b.volume as f64),
    }
}

fn rolling_mean(
    bars: &[PriceBar],
    period: usize,
    field: impl Fn(&PriceBar) -> f64,
) -> Vec<IndicatorPoint> {
    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += field(bar);
        if period > 0 && i >= period {
            sum -= field(&bars[i - period]);
        }
        let valid = period > 0 && i + 1 >= period;
        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: if valid { sum / period as f64 } else { 0.0 },
        });
    }

    values
}
