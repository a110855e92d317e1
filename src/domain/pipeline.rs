//! Cleaning pipeline: NA cleanup, date normalization and deduplication per security.
//!
//! Each security is cleaned independently, so the batch runs on a rayon pool
//! with the calendar shared read-only. A failure stays with its security.

use crate::domain::calendar::TradingCalendar;
use crate::domain::dedup::dedup_on_date;
use crate::domain::error::{CalendarError, CefnavError};
use crate::domain::na_clean::clean_nas;
use crate::domain::normalize::normalize_all;
use crate::domain::quote::QuoteRecord;
use crate::ports::record_store_port::{CleanedSink, RecordStore};
use log::{info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Clean one security's full history.
///
/// Records are stable-sorted by (quote_date, time) first so the forward fill
/// runs in chronological order.
pub fn clean_records(
    mut records: Vec<QuoteRecord>,
    calendar: &TradingCalendar,
) -> Result<Vec<QuoteRecord>, CalendarError> {
    records.sort_by_key(|r| (r.quote_date, r.time));
    let filled = clean_nas(records);
    let normalized = normalize_all(&filled, calendar)?;
    Ok(dedup_on_date(normalized))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSecurity {
    pub symbol: String,
    pub input_records: usize,
    pub records: Vec<QuoteRecord>,
}

#[derive(Debug)]
pub struct CleanFailure {
    pub symbol: String,
    pub error: CefnavError,
}

#[derive(Debug, Default)]
pub struct CleanSummary {
    pub cleaned: Vec<CleanedSecurity>,
    pub failures: Vec<CleanFailure>,
}

/// Read, clean and write back one security.
pub fn clean_security<S, W>(
    store: &S,
    sink: &W,
    symbol: &str,
    calendar: &TradingCalendar,
) -> Result<CleanedSecurity, CefnavError>
where
    S: RecordStore + ?Sized,
    W: CleanedSink + ?Sized,
{
    let history = store.read_all(symbol)?;
    let input_records = history.len();
    let records = clean_records(history, calendar)?;
    sink.write_cleaned(symbol, &records)?;
    info!("{symbol}: {input_records} records -> {} cleaned", records.len());
    Ok(CleanedSecurity {
        symbol: symbol.to_string(),
        input_records,
        records,
    })
}

/// Pool for the cleaning fan-out. Zero workers means one per available core.
pub fn build_pool(workers: usize) -> Result<ThreadPool, CefnavError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("cefnav-clean-{i}"))
        .build()
        .map_err(|e| CefnavError::ConfigInvalid {
            section: "clean".into(),
            key: "workers".into(),
            reason: e.to_string(),
        })
}

/// Clean every listed security in parallel. Results are ordered by symbol.
pub fn clean_all<S, W>(
    pool: &ThreadPool,
    store: &S,
    sink: &W,
    symbols: &[String],
    calendar: &TradingCalendar,
) -> CleanSummary
where
    S: RecordStore + Sync + ?Sized,
    W: CleanedSink + Sync + ?Sized,
{
    let mut results: Vec<(String, Result<CleanedSecurity, CefnavError>)> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| {
                (
                    symbol.clone(),
                    clean_security(store, sink, symbol, calendar),
                )
            })
            .collect()
    });
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = CleanSummary::default();
    for (symbol, result) in results {
        match result {
            Ok(cleaned) => summary.cleaned.push(cleaned),
            Err(error) => {
                warn!("{symbol}: cleaning failed: {error}");
                summary.failures.push(CleanFailure { symbol, error });
            }
        }
    }
    summary
}
