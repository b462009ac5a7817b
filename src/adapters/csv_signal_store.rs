//! CSV-backed signal and position ledgers.
//!
//! Layout is one row per date, one column per ticker:
//! `Date,<ticker>...`. Cells a run never wrote are filled with the
//! ledger's empty cell (`Hold` or `Neutral`).

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::FibtraderError;
use crate::domain::signal_table::{LedgerCell, PositionTable, SignalTable};
use crate::ports::signal_store::{PositionStore, SignalStore};

const DATE_COLUMN: &str = "Date";

pub struct CsvSignalStore {
    path: PathBuf,
}

impl CsvSignalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_table<C: LedgerCell>(&self) -> Result<SignalTable<C>, FibtraderError> {
        let mut table = SignalTable::new();
        if !self.path.exists() {
            return Ok(table);
        }

        let mut rdr = csv::Reader::from_path(&self.path)?;
        let headers = rdr.headers()?.clone();
        let tickers: Vec<&str> = headers.iter().skip(1).map(str::trim).collect();

        for result in rdr.records() {
            let record = result?;
            let Some(date_str) = record.get(0) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                FibtraderError::data(&self.source_name(), format!("invalid date '{date_str}': {e}"))
            })?;

            for (ticker, cell) in tickers.iter().zip(record.iter().skip(1)) {
                let value: C = cell.parse().map_err(|reason: String| {
                    FibtraderError::data(&self.source_name(), format!("{date} {ticker}: {reason}"))
                })?;
                table.insert(date, ticker, value);
            }
        }

        Ok(table)
    }

    fn write_table<C: LedgerCell>(&self, table: &SignalTable<C>) -> Result<(), FibtraderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tickers: Vec<String> = table.tickers().into_iter().collect();

        let mut wtr = csv::Writer::from_path(&self.path)?;
        let mut header = vec![DATE_COLUMN.to_string()];
        header.extend(tickers.iter().cloned());
        wtr.write_record(&header)?;

        for date in table.dates() {
            let mut row = vec![date.format("%Y-%m-%d").to_string()];
            row.extend(
                tickers
                    .iter()
                    .map(|t| table.get(date, t).unwrap_or(C::EMPTY).to_string()),
            );
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        log::info!("saved {} ledger rows to {}", table.len(), self.path.display());
        Ok(())
    }
}

impl SignalStore for CsvSignalStore {
    fn load(&self) -> Result<SignalTable, FibtraderError> {
        self.read_table()
    }

    fn save(&self, table: &SignalTable) -> Result<(), FibtraderError> {
        self.write_table(table)
    }
}

impl PositionStore for CsvSignalStore {
    fn load_positions(&self) -> Result<PositionTable, FibtraderError> {
        self.read_table()
    }

    fn save_positions(&self, table: &PositionTable) -> Result<(), FibtraderError> {
        self.write_table(table)
    }
}
