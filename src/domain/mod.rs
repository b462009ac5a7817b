//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_bar;
pub mod ticker_data;
pub mod portfolio;
pub mod signal;
pub mod signal_table;
pub mod position;
pub mod execution;
pub mod backtest;
pub mod position_backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
