//! Technical indicator implementations.
//!
//! This module provides types for representing indicator series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, one point per input bar
//!
//! Fibonacci retracement levels are not a series of their own; they are derived
//! per bar from the swing high/low pair (see [`fibonacci`]).

pub mod atr;
pub mod ema;
pub mod fibonacci;
pub mod rsi;
pub mod sma;
pub mod swing;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    SwingHigh(usize),
    SwingLow(usize),
    Atr(usize),
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    VolumeSma(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at bar index `i`, or `None` during warmup or past the end.
    pub fn value_at(&self, i: usize) -> Option<f64> {
        self.values
            .get(i)
            .filter(|point| point.valid)
            .map(|point| point.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::SwingHigh(period) => write!(f, "SWING_HIGH({})", period),
            IndicatorType::SwingLow(period) => write!(f, "SWING_LOW({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
        }
    }
}
