//! Domain error types.

use crate::domain::security::UniverseError;
use chrono::NaiveDate;

/// Failure of a single request attempt against the quote source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("unreadable response body: {0}")]
    Body(String),
}

/// Trading-calendar failures: loading the calendar or resolving a date against it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    #[error("no trading day found for {symbol} within {shifts} days before {start}")]
    NoTradingDay {
        symbol: String,
        start: NaiveDate,
        shifts: u32,
    },

    #[error("invalid trading day on line {line}: {value:?}")]
    InvalidDate { line: usize, value: String },

    #[error("collection time {time} for {symbol} on {date} cannot be shifted to a trading day")]
    TimeOverflow {
        symbol: String,
        date: NaiveDate,
        time: i64,
    },
}

/// Top-level error type for cefnav.
#[derive(Debug, thiserror::Error)]
pub enum CefnavError {
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

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("record store error for {symbol}: {reason}")]
    Store { symbol: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CefnavError> for std::process::ExitCode {
    fn from(err: &CefnavError) -> Self {
        let code: u8 = match err {
            CefnavError::Io(_) => 1,
            CefnavError::ConfigParse { .. }
            | CefnavError::ConfigMissing { .. }
            | CefnavError::ConfigInvalid { .. }
            | CefnavError::Universe(_) => 2,
            CefnavError::Store { .. } => 3,
            CefnavError::Calendar(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
