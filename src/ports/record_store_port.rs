//! Per-security record store port trait.

use crate::domain::error::CefnavError;
use crate::domain::quote::QuoteRecord;

/// Append-only history of quote records, one store per symbol.
pub trait RecordStore {
    fn append(&self, record: &QuoteRecord) -> Result<(), CefnavError>;

    /// Every record for `symbol`, in stored order.
    fn read_all(&self, symbol: &str) -> Result<Vec<QuoteRecord>, CefnavError>;

    fn list_symbols(&self) -> Result<Vec<String>, CefnavError>;
}

/// Destination for the cleaned per-security view. Each write replaces the previous view.
pub trait CleanedSink {
    fn write_cleaned(&self, symbol: &str, records: &[QuoteRecord]) -> Result<(), CefnavError>;
}
