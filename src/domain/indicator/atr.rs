//! Average True Range indicator.
//!
//! TR[i] = max(H[i]-L[i], |H[i]-C[i-1]|, |L[i]-C[i-1]|)
//! ATR(n)[i] = mean(TR[i-n+1..=i])
//! Every bar in the window needs a previous close, so the first valid point
//! is at index n. This is a plain trailing mean, not Wilder smoothing.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i >= period;
        let value = if valid {
            let sum: f64 = (i + 1 - period..=i)
                .map(|j| bars[j].true_range(bars[j - 1].close))
                .sum();
            sum / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            adj_close: close,
            volume: 1000,
            daily_return: None,
        }
    }

    #[test]
    fn atr_warmup_needs_previous_close() {
        let bars: Vec<PriceBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);

        assert_eq!(series.values.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn atr_is_trailing_mean() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            // gap: |130 - 115| = 15 dominates high-low of 5
            make_bar(4, 130.0, 125.0, 128.0),
        ];
        let series = calculate_atr(&bars, 2);

        // TR[1]=10, TR[2]=10 → 10
        assert!((series.value_at(2).unwrap() - 10.0).abs() < 1e-9);
        // TR[2]=10, TR[3]=15 → 12.5
        assert!((series.value_at(3).unwrap() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn atr_not_wilder_smoothed() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 130.0, 100.0, 110.0),
            make_bar(3, 112.0, 108.0, 110.0),
            make_bar(4, 112.0, 108.0, 110.0),
        ];
        let series = calculate_atr(&bars, 1);

        // Window of one bar: ATR equals that bar's true range exactly.
        assert!((series.value_at(1).unwrap() - 30.0).abs() < 1e-9);
        assert!((series.value_at(2).unwrap() - 4.0).abs() < 1e-9);
        assert!((series.value_at(3).unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0), make_bar(2, 110.0, 90.0, 100.0)];
        let series = calculate_atr(&bars, 5);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn atr_zero_period() {
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0), make_bar(2, 110.0, 90.0, 100.0)];
        let series = calculate_atr(&bars, 0);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.indicator_type, IndicatorType::Atr(0));
    }
}
