//! Trade execution against the portfolio.
//!
//! Buys are gated on cash and the ticker's dynamic cap; sells only need a
//! non-zero holding. Neither path charges commission or applies slippage.

use crate::domain::indicator_bar::IndicatorBar;
use crate::domain::portfolio::PortfolioState;

/// Result of a buy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyResult {
    Executed {
        shares: f64,
        cost: f64,
        /// close strictly inside (swing_low, swing_high)
        correct: bool,
    },
    /// investment ≤ 0: the cap leaves no room for this ticker.
    NoRoom,
    InsufficientCash,
    CapExceeded,
}

/// Result of a sell attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SellResult {
    Executed {
        shares: f64,
        proceeds: f64,
        /// close strictly outside [swing_low, swing_high]
        correct: bool,
    },
    NoPosition,
}

/// Buy `investment` dollars of `ticker` at today's close.
///
/// Executes only if `investment > 0`, `cash ≥ investment` and
/// `allocation + investment ≤ dynamic_cap`. On success shares, cash and the
/// ticker's allocation move together.
pub fn execute_buy(
    portfolio: &mut PortfolioState,
    ticker: &str,
    bar: &IndicatorBar,
    investment: f64,
    dynamic_cap: f64,
) -> BuyResult {
    if investment <= 0.0 {
        return BuyResult::NoRoom;
    }
    if portfolio.cash < investment {
        return BuyResult::InsufficientCash;
    }
    let allocation = portfolio.allocation(ticker);
    if allocation + investment > dynamic_cap {
        return BuyResult::CapExceeded;
    }

    let shares = investment / bar.close();
    *portfolio.positions.entry(ticker.to_string()).or_insert(0.0) += shares;
    portfolio.cash -= investment;
    portfolio
        .allocation_value
        .insert(ticker.to_string(), allocation + investment);

    BuyResult::Executed {
        shares,
        cost: investment,
        correct: bar.within_swing_range(),
    }
}

/// Sell against `ticker` at today's close.
///
/// `investment` is divided by the close to get a share count, bounded by the
/// holding: `sold = min(position, investment / close)`.
pub fn execute_sell(
    portfolio: &mut PortfolioState,
    ticker: &str,
    bar: &IndicatorBar,
    investment: f64,
) -> SellResult {
    let position = portfolio.shares(ticker);
    if position <= 0.0 {
        return SellResult::NoPosition;
    }

    let close = bar.close();
    let sold = position.min(investment / close);
    let proceeds = sold * close;

    portfolio.cash += proceeds;
    portfolio.positions.insert(ticker.to_string(), position - sold);
    let allocation = portfolio.allocation(ticker);
    portfolio
        .allocation_value
        .insert(ticker.to_string(), allocation - proceeds);

    SellResult::Executed {
        shares: sold,
        proceeds,
        correct: bar.outside_swing_range(),
    }
}
