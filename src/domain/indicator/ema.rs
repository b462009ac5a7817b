//! Exponential moving average of adjusted close.
//!
//! k = 2/(n+1), seed with the SMA of the first n bars, then
//! EMA[i] = X[i]*k + EMA[i-1]*(1-k). Warmup: first (n-1) bars are invalid.

use std::cmp::Ordering;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let price = bar.adj_close;
        let valid = period > 0 && i + 1 >= period;
        if period > 0 {
            match (i + 1).cmp(&period) {
                Ordering::Less => sum += price,
                Ordering::Equal => {
                    sum += price;
                    ema = sum / period as f64;
                }
                Ordering::Greater => ema = price * k + ema * (1.0 - k),
            }
        }

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: if valid { ema } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
