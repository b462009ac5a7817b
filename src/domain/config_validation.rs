//! Configuration validation.
//!
//! Every strategy and indicator parameter is required; nothing falls back to
//! a built-in default. A missing key is [`FibtraderError::ConfigMissing`], a
//! present but unparsable or out-of-range value is
//! [`FibtraderError::ConfigInvalid`].

use crate::domain::error::FibtraderError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;

/// Validate every section a full run reads.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FibtraderError> {
    validate_data_config(config)?;
    validate_indicator_config(config)?;
    validate_backtest_config(config)?;
    if config.get_string("positions", "strategy").is_some() {
        validate_positions_config(config)?;
    }
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), FibtraderError> {
    require_string(config, "data", "dir")?;
    if let Some(tickers) = config.get_string("data", "tickers") {
        parse_tickers(&tickers).map_err(|e| invalid("data", "tickers", e.to_string()))?;
    }
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), FibtraderError> {
    for key in ["swing_period", "atr_period"] {
        let value = require_int(config, "indicators", key)?;
        if value < 1 {
            return Err(invalid("indicators", key, format!("{key} must be at least 1")));
        }
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), FibtraderError> {
    validate_positive(config, "initial_balance")?;
    for key in [
        "buy_full_below",
        "buy_half_above",
        "sell_full_above",
        "sell_half_above",
        "atr_volatility_threshold",
        "stop_loss_percent",
    ] {
        validate_non_negative(config, key)?;
    }
    validate_positive(config, "max_position_size")?;
    Ok(())
}

/// Strategy names accepted by `[positions] strategy`.
pub const POSITION_STRATEGIES: [&str; 4] = [
    "sma_crossover",
    "ema_crossover",
    "sma_rsi_volume",
    "ema_rsi_volume",
];

pub fn validate_positions_config(config: &dyn ConfigPort) -> Result<(), FibtraderError> {
    let strategy = require_string(config, "positions", "strategy")?;
    if !POSITION_STRATEGIES.contains(&strategy.as_str()) {
        return Err(invalid(
            "positions",
            "strategy",
            format!(
                "unknown strategy '{strategy}', expected one of {}",
                POSITION_STRATEGIES.join(", ")
            ),
        ));
    }

    let mut windows = vec!["short_window", "long_window"];
    if strategy.ends_with("_rsi_volume") {
        windows.extend(["rsi_window", "volume_window"]);
    }
    for key in windows {
        let value = require_int(config, "positions", key)?;
        if value < 1 {
            return Err(invalid("positions", key, format!("{key} must be at least 1")));
        }
    }

    let balance = require_double(config, "positions", "initial_balance")?;
    if balance <= 0.0 {
        return Err(invalid(
            "positions",
            "initial_balance",
            "initial_balance must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_positive(config: &dyn ConfigPort, key: &str) -> Result<(), FibtraderError> {
    let value = require_double(config, "backtest", key)?;
    if value <= 0.0 {
        return Err(invalid("backtest", key, format!("{key} must be positive")));
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, key: &str) -> Result<(), FibtraderError> {
    let value = require_double(config, "backtest", key)?;
    if value < 0.0 {
        return Err(invalid("backtest", key, format!("{key} must be non-negative")));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: String) -> FibtraderError {
    FibtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn missing(section: &str, key: &str) -> FibtraderError {
    FibtraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// A non-blank string value.
pub fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, FibtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(missing(section, key)),
    }
}

pub fn require_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<i64, FibtraderError> {
    config
        .get_int(section, key)
        .map_err(|reason| invalid(section, key, reason))?
        .ok_or_else(|| missing(section, key))
}

/// A finite floating-point value.
pub fn require_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<f64, FibtraderError> {
    let value = config
        .get_double(section, key)
        .map_err(|reason| invalid(section, key, reason))?
        .ok_or_else(|| missing(section, key))?;
    if !value.is_finite() {
        return Err(invalid(section, key, format!("{key} must be a finite number")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[data]
dir = data
tickers = AAPL,MSFT

[indicators]
swing_period = 10
atr_period = 7

[backtest]
initial_balance = 100000
buy_full_below = 0.5
buy_half_above = 0.25
sell_full_above = 0.2
sell_half_above = 0.1
atr_volatility_threshold = 0.2
stop_loss_percent = 0.02
max_position_size = 0.05
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    /// VALID with one `key = value` line replaced (or removed when `value` is None).
    fn with_value(key: &str, value: Option<&str>) -> FileConfigAdapter {
        let content: String = VALID
            .lines()
            .filter_map(|line| {
                if line.split('=').next().map(str::trim) == Some(key) {
                    value.map(|v| format!("{key} = {v}"))
                } else {
                    Some(line.to_string())
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        make_config(&content)
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&make_config(VALID)).is_ok());
    }

    #[test]
    fn tickers_are_optional() {
        assert!(validate_config(&with_value("tickers", None)).is_ok());
    }

    #[test]
    fn missing_data_dir_fails() {
        let err = validate_config(&with_value("dir", None)).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn bad_ticker_list_fails() {
        let err = validate_config(&with_value("tickers", Some("AAPL,,MSFT"))).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "tickers"));
    }

    #[test]
    fn every_backtest_key_is_required() {
        for key in [
            "initial_balance",
            "buy_full_below",
            "buy_half_above",
            "sell_full_above",
            "sell_half_above",
            "atr_volatility_threshold",
            "stop_loss_percent",
            "max_position_size",
        ] {
            let err = validate_config(&with_value(key, None)).unwrap_err();
            assert!(
                matches!(&err, FibtraderError::ConfigMissing { section, key: k } if section == "backtest" && k == key),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn missing_swing_period_fails() {
        let err = validate_config(&with_value("swing_period", None)).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigMissing { key, .. } if key == "swing_period"));
    }

    #[test]
    fn zero_atr_period_fails() {
        let err = validate_config(&with_value("atr_period", Some("0"))).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "atr_period"));
    }

    #[test]
    fn non_numeric_period_fails() {
        let err = validate_config(&with_value("swing_period", Some("ten"))).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "swing_period"));
    }

    #[test]
    fn initial_balance_must_be_positive() {
        let err = validate_config(&with_value("initial_balance", Some("0"))).unwrap_err();
        assert!(
            matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "initial_balance")
        );
    }

    #[test]
    fn max_position_size_must_be_positive() {
        let err = validate_config(&with_value("max_position_size", Some("-0.1"))).unwrap_err();
        assert!(
            matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "max_position_size")
        );
    }

    #[test]
    fn negative_multiplier_fails() {
        let err = validate_config(&with_value("sell_half_above", Some("-1"))).unwrap_err();
        assert!(
            matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "sell_half_above")
        );
    }

    #[test]
    fn zero_threshold_is_allowed() {
        assert!(validate_config(&with_value("atr_volatility_threshold", Some("0"))).is_ok());
    }

    #[test]
    fn non_numeric_double_fails() {
        let err = validate_config(&with_value("buy_full_below", Some("half"))).unwrap_err();
        assert!(
            matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "buy_full_below")
        );
    }

    const POSITIONS: &str = r#"
[positions]
strategy = sma_rsi_volume
short_window = 5
long_window = 20
rsi_window = 14
volume_window = 20
initial_balance = 100000
"#;

    fn with_positions(key: &str, value: Option<&str>) -> FileConfigAdapter {
        let content: String = POSITIONS
            .lines()
            .filter_map(|line| {
                if line.split('=').next().map(str::trim) == Some(key) {
                    value.map(|v| format!("{key} = {v}"))
                } else {
                    Some(line.to_string())
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        make_config(&format!("{VALID}\n{content}"))
    }

    #[test]
    fn positions_section_is_optional_and_checked_when_present() {
        assert!(validate_config(&with_positions("short_window", Some("5"))).is_ok());
        let err = validate_config(&with_positions("long_window", Some("0"))).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "long_window"));
    }

    #[test]
    fn unknown_position_strategy_fails() {
        let err =
            validate_positions_config(&with_positions("strategy", Some("macd"))).unwrap_err();
        assert!(matches!(err, FibtraderError::ConfigInvalid { key, .. } if key == "strategy"));
    }

    #[test]
    fn confirmed_strategy_needs_rsi_and_volume_windows() {
        let err =
            validate_positions_config(&with_positions("volume_window", None)).unwrap_err();
        assert!(
            matches!(err, FibtraderError::ConfigMissing { key, .. } if key == "volume_window")
        );
    }

    #[test]
    fn crossover_ignores_rsi_and_volume_windows() {
        let content = POSITIONS
            .replace("sma_rsi_volume", "ema_crossover")
            .replace("rsi_window = 14\n", "")
            .replace("volume_window = 20\n", "");
        assert!(validate_positions_config(&make_config(&content)).is_ok());
    }

    #[test]
    fn positions_initial_balance_required() {
        let err =
            validate_positions_config(&with_positions("initial_balance", None)).unwrap_err();
        assert!(matches!(
            err,
            FibtraderError::ConfigMissing { section, key } if section == "positions" && key == "initial_balance"
        ));
    }

    #[test]
    fn require_string_trims() {
        let config = make_config("[data]\ndir =   some/dir  \n");
        assert_eq!(require_string(&config, "data", "dir").unwrap(), "some/dir");
    }
}
