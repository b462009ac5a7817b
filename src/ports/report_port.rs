//! Report generation port trait.

use chrono::NaiveDate;

use crate::domain::error::FibtraderError;
use crate::domain::metrics::Metrics;

/// Port for publishing the outcome of a run.
pub trait ReportPort {
    /// Human-readable metrics summary.
    fn write_metrics(&mut self, metrics: &Metrics) -> Result<(), FibtraderError>;

    /// `(date, cumulative PnL)` series for an external chart renderer.
    fn write_pnl_series(&mut self, series: &[(NaiveDate, f64)]) -> Result<(), FibtraderError>;
}
