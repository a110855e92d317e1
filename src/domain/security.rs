//! Security identifiers and the configured universe.
//!
//! A security is an (exchange, symbol) pair written as `EXCHANGE:SYMBOL`,
//! e.g. `XNYS:BME`. The symbol alone keys the record store.

use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityId {
    pub exchange: String,
    pub symbol: String,
}

impl SecurityId {
    pub fn new(exchange: &str, symbol: &str) -> Self {
        Self {
            exchange: exchange.trim().to_uppercase(),
            symbol: symbol.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in security list")]
    EmptyToken,

    #[error("expected EXCHANGE:SYMBOL, got {0:?}")]
    Malformed(String),

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("no securities configured")]
    Empty,
}

/// Parse a single `EXCHANGE:SYMBOL` token.
pub fn parse_security(token: &str) -> Result<SecurityId, UniverseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(UniverseError::EmptyToken);
    }
    match trimmed.split_once(':') {
        Some((exchange, symbol)) if !exchange.trim().is_empty() && !symbol.trim().is_empty() => {
            Ok(SecurityId::new(exchange, symbol))
        }
        _ => Err(UniverseError::Malformed(trimmed.to_string())),
    }
}

/// Parse a comma-separated list of `EXCHANGE:SYMBOL` tokens, preserving order.
pub fn parse_securities(input: &str) -> Result<Vec<SecurityId>, UniverseError> {
    let mut securities = Vec::new();
    for token in input.split(',') {
        securities.push(parse_security(token)?);
    }
    ensure_unique(securities)
}

/// Reject duplicate symbols: two securities may not share a record store.
pub fn ensure_unique(securities: Vec<SecurityId>) -> Result<Vec<SecurityId>, UniverseError> {
    if securities.is_empty() {
        return Err(UniverseError::Empty);
    }
    let mut seen = HashSet::new();
    for security in &securities {
        if !seen.insert(security.symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(security.symbol.clone()));
        }
    }
    Ok(securities)
}
