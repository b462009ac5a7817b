//! Market data access port trait.

use crate::domain::error::FibtraderError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// All bars for `ticker`, in ascending date order.
    ///
    /// Malformed input for a single ticker is reported as a data error
    /// ([`FibtraderError::is_data_error`]) so the caller can skip it.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, FibtraderError>;

    /// Tickers available from this source, sorted.
    fn list_tickers(&self) -> Result<Vec<String>, FibtraderError>;
}
