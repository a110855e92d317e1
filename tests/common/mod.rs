#![allow(dead_code)]

use cefnav::domain::error::{CefnavError, FetchError};
use cefnav::domain::fetcher::ResilientFetcher;
use cefnav::domain::quote::QuoteRecord;
use cefnav::domain::retry::{FixedBackoff, RetryPolicy, Sleeper};
use cefnav::domain::security::SecurityId;
use cefnav::ports::quote_source_port::QuoteSource;
use cefnav::ports::record_store_port::{CleanedSink, RecordStore};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves scripted responses per symbol, then a fallback page forever.
pub struct MockQuoteSource {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    fallback: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page(mut self, symbol: &str, body: &str) -> Self {
        self.fallback.insert(symbol.to_string(), body.to_string());
        self
    }

    /// Fail the next `count` requests for `symbol` before serving its page.
    pub fn with_failures(self, symbol: &str, count: usize) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts.entry(symbol.to_string()).or_default();
            for i in 0..count {
                queue.push_back(Err(FetchError::Transport(format!("connection reset #{}", i + 1))));
            }
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuoteSource for MockQuoteSource {
    fn fetch_page(&self, security: &SecurityId) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&security.symbol)
            .and_then(|q| q.pop_front())
        {
            return next;
        }
        self.fallback
            .get(&security.symbol)
            .cloned()
            .ok_or_else(|| FetchError::Status { status: 404 })
    }
}

/// In-memory record store and cleaned sink, shareable across the clean pool.
#[derive(Default)]
pub struct MemoryRecordStore {
    pub histories: Mutex<HashMap<String, Vec<QuoteRecord>>>,
    pub cleaned: Mutex<HashMap<String, Vec<QuoteRecord>>>,
    pub unreadable: HashSet<String>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, symbol: &str, records: Vec<QuoteRecord>) -> Self {
        self.histories
            .lock()
            .unwrap()
            .insert(symbol.to_string(), records);
        self
    }

    pub fn with_unreadable(mut self, symbol: &str) -> Self {
        self.unreadable.insert(symbol.to_string());
        self.histories
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default();
        self
    }

    pub fn history(&self, symbol: &str) -> Vec<QuoteRecord> {
        self.histories
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }

    pub fn cleaned(&self, symbol: &str) -> Option<Vec<QuoteRecord>> {
        self.cleaned.lock().unwrap().get(symbol).cloned()
    }
}

impl RecordStore for MemoryRecordStore {
    fn append(&self, record: &QuoteRecord) -> Result<(), CefnavError> {
        self.histories
            .lock()
            .unwrap()
            .entry(record.symbol.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<QuoteRecord>, CefnavError> {
        if self.unreadable.contains(symbol) {
            return Err(CefnavError::Store {
                symbol: symbol.to_string(),
                reason: "corrupt store".into(),
            });
        }
        Ok(self.history(symbol))
    }

    fn list_symbols(&self) -> Result<Vec<String>, CefnavError> {
        let mut symbols: Vec<String> = self.histories.lock().unwrap().keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

impl CleanedSink for MemoryRecordStore {
    fn write_cleaned(&self, symbol: &str, records: &[QuoteRecord]) -> Result<(), CefnavError> {
        self.cleaned
            .lock()
            .unwrap()
            .insert(symbol.to_string(), records.to_vec());
        Ok(())
    }
}

pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) -> bool {
        true
    }
}

pub fn instant_fetcher(max_attempts: u32) -> ResilientFetcher {
    ResilientFetcher::new(
        RetryPolicy::new(max_attempts),
        Box::new(FixedBackoff(Duration::ZERO)),
        std::sync::Arc::new(NoSleep),
    )
}

/// Minimal quote-header page with the fields the extractor reads.
pub fn quote_page(price: &str, nav: &str, nav_date: &str) -> String {
    format!(
        "<html><body>\n\t<div id=\"lastPrice\">{price}</div>\n\
         <table><tr><td id=\"last-act-nav\">{nav}</td><td>{nav_date}</td></tr></table>\n\
         </body></html>"
    )
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, minute, 0).unwrap()
}

pub fn record(
    symbol: &str,
    quote_date: NaiveDate,
    time: i64,
    price: Option<f64>,
    nav: Option<f64>,
) -> QuoteRecord {
    QuoteRecord::new(symbol, quote_date, None, price, nav, time)
}

pub fn security(token: &str) -> SecurityId {
    cefnav::domain::security::parse_security(token).unwrap()
}
