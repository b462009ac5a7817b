//! Plain-text report adapter implementing ReportPort.
//!
//! Metrics go to any `Write` sink (stdout in the CLI). The PnL series is
//! written as a `date,cumulative_pnl` CSV when a path is configured.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::FibtraderError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct PnlRow {
    date: String,
    cumulative_pnl: f64,
}

pub struct TextReportAdapter<W: Write> {
    out: W,
    pnl_path: Option<PathBuf>,
}

impl<W: Write> TextReportAdapter<W> {
    pub fn new(out: W, pnl_path: Option<PathBuf>) -> Self {
        Self { out, pnl_path }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_metrics(metrics: &Metrics) -> String {
    let mut s = String::from("Portfolio Performance Metrics:\n");
    s.push_str(&format!("Initial Balance: ${:.2}\n", metrics.initial_balance));
    s.push_str(&format!("Final Balance: ${:.2}\n", metrics.final_value));
    s.push_str(&format!("Total Return: {:.2}%\n", metrics.total_return * 100.0));
    s.push_str(&format!(
        "Average Daily Return: {:.2}%\n",
        metrics.avg_daily_return * 100.0
    ));
    s.push_str(&format!("Volatility: {:.2}%\n", metrics.volatility * 100.0));
    s.push_str(&format!(
        "Annualized Sharpe Ratio: {:.2}\n",
        metrics.sharpe_ratio
    ));
    s.push_str(&format!(
        "Maximum Drawdown: {:.2}%\n",
        metrics.max_drawdown * 100.0
    ));
    s.push_str(&format!("Signal Accuracy: {:.2}%\n", metrics.accuracy * 100.0));
    s
}

/// Serialize `(date, pnl)` pairs as `date,cumulative_pnl` CSV.
pub fn write_pnl_csv<T: Write>(
    writer: T,
    series: &[(NaiveDate, f64)],
) -> Result<(), FibtraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for &(date, pnl) in series {
        wtr.serialize(PnlRow {
            date: date.format("%Y-%m-%d").to_string(),
            cumulative_pnl: pnl,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

impl<W: Write> ReportPort for TextReportAdapter<W> {
    fn write_metrics(&mut self, metrics: &Metrics) -> Result<(), FibtraderError> {
        self.out.write_all(format_metrics(metrics).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn write_pnl_series(&mut self, series: &[(NaiveDate, f64)]) -> Result<(), FibtraderError> {
        let Some(path) = &self.pnl_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        write_pnl_csv(file, series)?;
        log::info!("PnL series written to {}", path.display());
        Ok(())
    }
}
