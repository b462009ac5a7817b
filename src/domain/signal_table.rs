//! Date-keyed ledgers of per-ticker signals.
//!
//! The table is owned by the caller and handed to each strategy run by
//! mutable reference; a [`SignalStore`](crate::ports::signal_store::SignalStore)
//! or [`PositionStore`](crate::ports::signal_store::PositionStore) loads and
//! saves it between runs. Each run overwrites only the cells it evaluates.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::domain::position::Position;
use crate::domain::signal::{SignalKind, TradeSignal};

/// A value that can sit in a ledger cell and round-trip through text.
pub trait LedgerCell: Copy + fmt::Display + FromStr<Err = String> {
    /// Stands in for a (date, ticker) cell nothing was recorded in.
    const EMPTY: Self;
}

impl LedgerCell for SignalKind {
    const EMPTY: Self = SignalKind::Hold;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable<C = SignalKind> {
    rows: BTreeMap<NaiveDate, BTreeMap<String, C>>,
}

/// Long/Short/Neutral ledger written by the position strategies.
pub type PositionTable = SignalTable<Position>;

impl<C> Default for SignalTable<C> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl SignalTable<SignalKind> {
    /// Record `signal` under its (date, ticker), replacing any earlier entry.
    pub fn merge(&mut self, signal: &TradeSignal) {
        self.insert(signal.date, &signal.ticker, signal.kind);
    }
}

impl<C: Copy> SignalTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, ticker: &str, cell: C) {
        self.rows
            .entry(date)
            .or_default()
            .insert(ticker.to_string(), cell);
    }

    pub fn get(&self, date: NaiveDate, ticker: &str) -> Option<C> {
        self.rows.get(&date)?.get(ticker).copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Every ticker that appears on any date, in sorted order.
    pub fn tickers(&self) -> BTreeSet<String> {
        self.rows
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect()
    }

    pub fn row(&self, date: NaiveDate) -> Option<&BTreeMap<String, C>> {
        self.rows.get(&date)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn signal(day: u32, ticker: &str, kind: SignalKind) -> TradeSignal {
        TradeSignal {
            ticker: ticker.into(),
            date: d(day),
            kind,
            requested_amount: 0.0,
        }
    }

    #[test]
    fn merge_adds_rows() {
        let mut table = SignalTable::new();
        table.merge(&signal(2, "AAPL", SignalKind::Buy));
        table.merge(&signal(1, "MSFT", SignalKind::Hold));
        table.merge(&signal(2, "MSFT", SignalKind::Sell));

        assert_eq!(table.len(), 2);
        assert_eq!(table.dates().collect::<Vec<_>>(), vec![d(1), d(2)]);
        assert_eq!(table.get(d(2), "AAPL"), Some(SignalKind::Buy));
        assert_eq!(table.get(d(2), "MSFT"), Some(SignalKind::Sell));
        assert_eq!(table.get(d(1), "AAPL"), None);
    }

    #[test]
    fn merge_overwrites_same_cell() {
        let mut table = SignalTable::new();
        table.merge(&signal(1, "AAPL", SignalKind::Buy));
        table.merge(&signal(1, "AAPL", SignalKind::Sell));

        assert_eq!(table.get(d(1), "AAPL"), Some(SignalKind::Sell));
        assert_eq!(table.row(d(1)).unwrap().len(), 1);
    }

    #[test]
    fn tickers_union_is_sorted() {
        let mut table = SignalTable::new();
        table.insert(d(1), "MSFT", SignalKind::Hold);
        table.insert(d(3), "AAPL", SignalKind::Hold);
        table.insert(d(3), "MSFT", SignalKind::Buy);

        let tickers: Vec<String> = table.tickers().into_iter().collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn empty_table() {
        let table: SignalTable = SignalTable::default();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.tickers().is_empty());
    }

    #[test]
    fn position_table_holds_positions() {
        let mut table = PositionTable::new();
        table.insert(d(1), "AAPL", Position::Long);
        table.insert(d(1), "AAPL", Position::Short);

        assert_eq!(table.get(d(1), "AAPL"), Some(Position::Short));
        assert_eq!(Position::EMPTY, Position::Neutral);
        assert_eq!(SignalKind::EMPTY, SignalKind::Hold);
    }
}
