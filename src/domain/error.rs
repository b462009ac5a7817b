//! Domain error types.
//!
//! Errors fall into two families. Data errors are scoped to a single ticker:
//! the ticker is dropped from the run with a warning. Config errors abort the
//! whole run before any metrics are produced.

/// Top-level error type for fibtrader.
#[derive(Debug, thiserror::Error)]
pub enum FibtraderError {
    #[error("invalid data for {ticker}: {reason}")]
    DataParse { ticker: String, reason: String },

    #[error("no rows in input for {ticker}")]
    EmptyInput { ticker: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data: no tickers loaded")]
    NoTickers,

    #[error("no data: tickers loaded but no dates to simulate")]
    EmptyTimeline,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl FibtraderError {
    /// True for errors that only disqualify one ticker.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            FibtraderError::DataParse { .. } | FibtraderError::EmptyInput { .. }
        )
    }

    pub(crate) fn data(ticker: &str, reason: impl Into<String>) -> Self {
        FibtraderError::DataParse {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&FibtraderError> for std::process::ExitCode {
    fn from(err: &FibtraderError) -> Self {
        let code: u8 = match err {
            FibtraderError::Io(_) | FibtraderError::Csv(_) => 1,
            FibtraderError::ConfigParse { .. }
            | FibtraderError::ConfigMissing { .. }
            | FibtraderError::ConfigInvalid { .. } => 2,
            FibtraderError::DataParse { .. }
            | FibtraderError::EmptyInput { .. }
            | FibtraderError::NoTickers
            | FibtraderError::EmptyTimeline => 5,
        };
        std::process::ExitCode::from(code)
    }
}
