//! Fibonacci crossing rules and per-day signal evaluation.
//!
//! Rules are applied as an ordered list: every rule whose crossing matches
//! overwrites the signal produced by earlier matches. The last match wins.
//! This is not a priority scheme, and reordering the tables changes results.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::indicator::fibonacci::{FibLevel, FibLevels};
use crate::domain::indicator_bar::IndicatorBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "Buy"),
            SignalKind::Sell => write!(f, "Sell"),
            SignalKind::Hold => write!(f, "Hold"),
        }
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(SignalKind::Buy),
            "sell" => Ok(SignalKind::Sell),
            "hold" | "neutral" | "" => Ok(SignalKind::Hold),
            other => Err(format!("unknown signal kind '{}'", other)),
        }
    }
}

/// A signal produced and consumed within one simulated day.
///
/// `requested_amount` is dollars for a Buy and a share-derived quantity for a
/// Sell (see [`Sizing`]).
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSignal {
    pub ticker: String,
    pub date: NaiveDate,
    pub kind: SignalKind,
    pub requested_amount: f64,
}

/// Which way price must cross a level for the rule to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// prev_close > level && close <= level
    Down,
    /// prev_close < level && close >= level
    Up,
}

impl Crossing {
    pub fn matches(self, prev_close: f64, close: f64, level: f64) -> bool {
        match self {
            Crossing::Down => prev_close > level && close <= level,
            Crossing::Up => prev_close < level && close >= level,
        }
    }
}

/// Which configured multiplier sizes the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    BuyHalfAbove,
    BuyFullBelow,
    SellHalfAbove,
    SellFullAbove,
}

impl Sizing {
    pub fn multiplier(self, config: &BacktestConfig) -> f64 {
        match self {
            Sizing::BuyHalfAbove => config.buy_half_above,
            Sizing::BuyFullBelow => config.buy_full_below,
            Sizing::SellHalfAbove => config.sell_half_above,
            Sizing::SellFullAbove => config.sell_full_above,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRule {
    pub level: FibLevel,
    pub crossing: Crossing,
    pub kind: SignalKind,
    pub sizing: Sizing,
}

impl SignalRule {
    pub fn matches(&self, prev_close: f64, close: f64, fib: &FibLevels) -> bool {
        self.crossing.matches(prev_close, close, fib.get(self.level))
    }
}

/// Entry rules, in evaluation order.
pub const ENTRY_RULES: [SignalRule; 3] = [
    SignalRule {
        level: FibLevel::L23_6,
        crossing: Crossing::Down,
        kind: SignalKind::Buy,
        sizing: Sizing::BuyHalfAbove,
    },
    SignalRule {
        level: FibLevel::L38_2,
        crossing: Crossing::Down,
        kind: SignalKind::Buy,
        sizing: Sizing::BuyFullBelow,
    },
    SignalRule {
        level: FibLevel::L61_8,
        crossing: Crossing::Down,
        kind: SignalKind::Buy,
        sizing: Sizing::BuyFullBelow,
    },
];

/// Exit rules, evaluated after the entry rules.
pub const EXIT_RULES: [SignalRule; 2] = [
    SignalRule {
        level: FibLevel::L78_6,
        crossing: Crossing::Up,
        kind: SignalKind::Sell,
        sizing: Sizing::SellHalfAbove,
    },
    SignalRule {
        level: FibLevel::L61_8,
        crossing: Crossing::Up,
        kind: SignalKind::Sell,
        sizing: Sizing::SellFullAbove,
    },
];

/// Inputs for one ticker's signal on one day.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub previous: &'a IndicatorBar,
    pub current: &'a IndicatorBar,
    pub available_room: f64,
    pub position_shares: f64,
    pub base_allocation: f64,
    pub config: &'a BacktestConfig,
}

/// ATR ≤ threshold × close. NaN inputs fail the filter.
pub fn passes_volatility_filter(bar: &IndicatorBar, threshold: f64) -> bool {
    bar.atr <= threshold * bar.close()
}

pub fn evaluate_signal(ticker: &str, ctx: &SignalContext<'_>) -> TradeSignal {
    let mut signal = TradeSignal {
        ticker: ticker.to_string(),
        date: ctx.current.date(),
        kind: SignalKind::Hold,
        requested_amount: 0.0,
    };

    if !passes_volatility_filter(ctx.current, ctx.config.atr_volatility_threshold) {
        return signal;
    }

    let prev_close = ctx.previous.close();
    let close = ctx.current.close();

    for rule in ENTRY_RULES.iter().chain(EXIT_RULES.iter()) {
        if !rule.matches(prev_close, close, &ctx.current.fib) {
            continue;
        }
        let m = rule.sizing.multiplier(ctx.config);
        signal.kind = rule.kind;
        signal.requested_amount = match rule.kind {
            SignalKind::Buy => ctx.available_room.min(ctx.base_allocation * m),
            SignalKind::Sell => ctx.position_shares * m,
            SignalKind::Hold => 0.0,
        };
    }

    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;

    fn config() -> BacktestConfig {
        BacktestConfig {
            initial_balance: 100_000.0,
            buy_full_below: 0.5,
            buy_half_above: 0.25,
            sell_full_above: 0.2,
            sell_half_above: 0.1,
            atr_volatility_threshold: 0.2,
            stop_loss_percent: 0.02,
            max_position_size: 0.05,
        }
    }

    /// swing 110/100: 23.6→107.64, 38.2→106.18, 61.8→103.82, 78.6→102.14
    fn bar(close: f64, atr: f64) -> IndicatorBar {
        IndicatorBar {
            bar: PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                adj_close: close,
                volume: 1000,
                daily_return: None,
            },
            swing_high: 110.0,
            swing_low: 100.0,
            fib: FibLevels::from_swing(110.0, 100.0),
            atr,
        }
    }

    fn evaluate(prev: f64, cur: f64, room: f64, shares: f64) -> TradeSignal {
        let cfg = config();
        let previous = bar(prev, 1.0);
        let current = bar(cur, 1.0);
        let ctx = SignalContext {
            previous: &previous,
            current: &current,
            available_room: room,
            position_shares: shares,
            base_allocation: 25_000.0,
            config: &cfg,
        };
        evaluate_signal("AAPL", &ctx)
    }

    #[test]
    fn crossing_down_and_up() {
        assert!(Crossing::Down.matches(104.0, 103.0, 103.82));
        assert!(Crossing::Down.matches(104.0, 103.82, 103.82));
        assert!(!Crossing::Down.matches(103.82, 103.0, 103.82));
        assert!(Crossing::Up.matches(103.0, 104.0, 103.82));
        assert!(Crossing::Up.matches(103.0, 103.82, 103.82));
        assert!(!Crossing::Up.matches(103.82, 104.0, 103.82));
    }

    #[test]
    fn no_crossing_holds() {
        let s = evaluate(105.0, 105.5, 10_000.0, 0.0);
        assert_eq!(s.kind, SignalKind::Hold);
        assert_eq!(s.requested_amount, 0.0);
    }

    #[test]
    fn cross_below_61_8_buys_full() {
        let s = evaluate(104.0, 103.0, 100_000.0, 0.0);
        assert_eq!(s.kind, SignalKind::Buy);
        assert!((s.requested_amount - 25_000.0 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn cross_below_23_6_buys_half() {
        let s = evaluate(108.0, 107.0, 100_000.0, 0.0);
        assert_eq!(s.kind, SignalKind::Buy);
        assert!((s.requested_amount - 25_000.0 * 0.25).abs() < 1e-9);
    }

    #[test]
    fn later_entry_rule_overwrites_earlier() {
        // Falls through both 23.6 and 38.2: the 38.2 sizing must win.
        let s = evaluate(108.0, 106.0, 100_000.0, 0.0);
        assert_eq!(s.kind, SignalKind::Buy);
        assert!((s.requested_amount - 25_000.0 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn buy_capped_by_available_room() {
        let s = evaluate(104.0, 103.0, 1_000.0, 0.0);
        assert_eq!(s.kind, SignalKind::Buy);
        assert!((s.requested_amount - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn cross_above_78_6_sells_half_of_shares() {
        let s = evaluate(102.0, 102.5, 0.0, 40.0);
        assert_eq!(s.kind, SignalKind::Sell);
        assert!((s.requested_amount - 40.0 * 0.1).abs() < 1e-9);
    }

    #[test]
    fn later_exit_rule_overwrites_earlier() {
        // Rises through 78.6 and 61.8: the 61.8 sizing must win.
        let s = evaluate(102.0, 104.0, 0.0, 40.0);
        assert_eq!(s.kind, SignalKind::Sell);
        assert!((s.requested_amount - 40.0 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn volatility_filter_blocks_signals() {
        let cfg = config();
        let previous = bar(104.0, 1.0);
        // 0.2 * 103 = 20.6 < 25
        let current = bar(103.0, 25.0);
        let ctx = SignalContext {
            previous: &previous,
            current: &current,
            available_room: 100_000.0,
            position_shares: 0.0,
            base_allocation: 25_000.0,
            config: &cfg,
        };
        assert_eq!(evaluate_signal("AAPL", &ctx).kind, SignalKind::Hold);
    }

    #[test]
    fn volatility_filter_boundary_is_inclusive() {
        let b = bar(100.0, 20.0);
        assert!(passes_volatility_filter(&b, 0.2));
        assert!(!passes_volatility_filter(&bar(100.0, f64::NAN), 0.2));
    }

    #[test]
    fn signal_carries_ticker_and_date() {
        let s = evaluate(104.0, 103.0, 100_000.0, 0.0);
        assert_eq!(s.ticker, "AAPL");
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn rule_tables_keep_their_order() {
        let entry: Vec<FibLevel> = ENTRY_RULES.iter().map(|r| r.level).collect();
        let exit: Vec<FibLevel> = EXIT_RULES.iter().map(|r| r.level).collect();
        assert_eq!(entry, vec![FibLevel::L23_6, FibLevel::L38_2, FibLevel::L61_8]);
        assert_eq!(exit, vec![FibLevel::L78_6, FibLevel::L61_8]);
    }

    #[test]
    fn signal_kind_parse_and_display() {
        assert_eq!("buy".parse::<SignalKind>().unwrap(), SignalKind::Buy);
        assert_eq!(" Sell ".parse::<SignalKind>().unwrap(), SignalKind::Sell);
        assert_eq!("Neutral".parse::<SignalKind>().unwrap(), SignalKind::Hold);
        assert!("short".parse::<SignalKind>().is_err());
        assert_eq!(SignalKind::Hold.to_string(), "Hold");
    }
}
