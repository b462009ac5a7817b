//! Performance metrics reduced from a finished simulation.

use super::backtest::BacktestResult;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_balance: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub avg_daily_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub accuracy: f64,
    pub total_signals: usize,
    pub correct_signals: usize,
    pub trading_days: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        Self::from_series(
            result.initial_balance,
            result.final_value,
            &result.daily_returns(),
            &result.drawdowns(),
            result.total_signals,
            result.correct_signals,
        )
    }

    pub fn from_series(
        initial_balance: f64,
        final_value: f64,
        returns: &[f64],
        drawdowns: &[f64],
        total_signals: usize,
        correct_signals: usize,
    ) -> Self {
        let total_return = if initial_balance > 0.0 {
            (final_value - initial_balance) / initial_balance
        } else {
            0.0
        };

        let (avg_daily_return, volatility, sharpe_ratio) = compute_risk_adjusted(returns);

        let accuracy = if total_signals > 0 {
            correct_signals as f64 / total_signals as f64
        } else {
            0.0
        };

        Metrics {
            initial_balance,
            final_value,
            total_return,
            avg_daily_return,
            volatility,
            sharpe_ratio,
            max_drawdown: compute_max_drawdown(drawdowns),
            accuracy,
            total_signals,
            correct_signals,
            trading_days: returns.len(),
        }
    }
}

/// Most negative drawdown; 0 for an empty series.
fn compute_max_drawdown(drawdowns: &[f64]) -> f64 {
    drawdowns.iter().copied().fold(0.0_f64, f64::min)
}

/// (mean, population std dev, annualized Sharpe). All zero for empty input.
fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let sharpe = if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (mean, stddev, sharpe)
}
