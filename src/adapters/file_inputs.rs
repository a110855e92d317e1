//! Flat-file inputs: the trading-day calendar and the universe mapping file.

use crate::domain::calendar::TradingCalendar;
use crate::domain::error::CefnavError;
use crate::domain::security::{SecurityId, UniverseError, ensure_unique};
use std::fs;
use std::path::Path;

pub fn load_calendar(path: &Path) -> Result<TradingCalendar, CefnavError> {
    let content = fs::read_to_string(path).map_err(|e| {
        CefnavError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read trading days {}: {}", path.display(), e),
        ))
    })?;
    Ok(TradingCalendar::parse(&content)?)
}

/// Read `symbol,exchange` rows (no header). Blank rows are skipped.
pub fn load_universe(path: &Path) -> Result<Vec<SecurityId>, CefnavError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CefnavError::ConfigInvalid {
            section: "paths".into(),
            key: "universe_file".into(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

    let mut securities = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| CefnavError::ConfigInvalid {
            section: "paths".into(),
            key: "universe_file".into(),
            reason: format!("CSV parse error: {}", e),
        })?;
        let symbol = row.get(0).unwrap_or("");
        let exchange = row.get(1).unwrap_or("");
        if symbol.is_empty() && exchange.is_empty() {
            continue;
        }
        if symbol.is_empty() || exchange.is_empty() {
            return Err(UniverseError::Malformed(row.iter().collect::<Vec<_>>().join(",")).into());
        }
        securities.push(SecurityId::new(exchange, symbol));
    }

    Ok(ensure_unique(securities)?)
}
