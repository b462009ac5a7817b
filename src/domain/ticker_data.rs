//! Per-ticker indicator data and the unified simulation timeline.

use crate::domain::indicator_bar::IndicatorBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct TickerData {
    pub ticker: String,
    pub bars: Vec<IndicatorBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl TickerData {
    /// `bars` must already be in ascending date order.
    pub fn new(ticker: String, bars: Vec<IndicatorBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date(), i))
            .collect();
        Self {
            ticker,
            bars,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&IndicatorBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// The bar for `date` together with the ticker's preceding bar.
    ///
    /// `None` when the ticker has no row on `date`, or when `date` is its
    /// first observed row.
    pub fn bar_with_previous(&self, date: NaiveDate) -> Option<(&IndicatorBar, &IndicatorBar)> {
        let i = self.get_bar_index(date)?;
        if i == 0 {
            return None;
        }
        Some((&self.bars[i - 1], &self.bars[i]))
    }

    pub fn last_bar(&self) -> Option<&IndicatorBar> {
        self.bars.last()
    }
}

pub fn build_unified_timeline(tickers: &[TickerData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = tickers
        .iter()
        .flat_map(|td| td.bars.iter().map(|bar| bar.date()))
        .collect();
    unique_dates.into_iter().collect()
}
