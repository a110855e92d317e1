//! Fetch orchestrator: one pass over the universe, one appended record per security.
//!
//! Runs sequentially. A throttle pause precedes every fetch so the remote
//! source sees a trickle of requests rather than a burst.

use crate::domain::error::CefnavError;
use crate::domain::extract::{extract, parse_document};
use crate::domain::fetcher::ResilientFetcher;
use crate::domain::quote::{QuoteRecord, collection_time};
use crate::domain::report::{FetchReport, MissingFields};
use crate::domain::security::SecurityId;
use crate::ports::quote_source_port::QuoteSource;
use crate::ports::record_store_port::RecordStore;
use chrono::{NaiveDateTime, Timelike};
use log::{info, warn};

pub struct FetchOrchestrator<'a> {
    source: &'a dyn QuoteSource,
    store: &'a dyn RecordStore,
    fetcher: ResilientFetcher,
    throttle: bool,
    clock: Box<dyn Fn() -> NaiveDateTime + 'a>,
}

impl<'a> FetchOrchestrator<'a> {
    pub fn new(
        source: &'a dyn QuoteSource,
        store: &'a dyn RecordStore,
        fetcher: ResilientFetcher,
        clock: Box<dyn Fn() -> NaiveDateTime + 'a>,
    ) -> Self {
        Self {
            source,
            store,
            fetcher,
            throttle: true,
            clock,
        }
    }

    pub fn with_throttle(mut self, throttle: bool) -> Self {
        self.throttle = throttle;
        self
    }

    /// Fetch every security in order.
    ///
    /// Fetch and parse failures are recorded and skipped. A store failure aborts
    /// the run and is returned as the error.
    pub fn run(&mut self, securities: &[SecurityId]) -> Result<FetchReport, CefnavError> {
        let run_date = (self.clock)().date();
        let mut report = FetchReport::new(run_date);

        for security in securities {
            if self.throttle && !self.fetcher.pause() {
                report.interrupted = true;
                break;
            }
            report.attempted += 1;

            let body = match self.fetcher.fetch(self.source, security) {
                Ok(body) => body,
                Err(failure) => {
                    warn!("could not open URL for {security}: {failure}");
                    let interrupted = failure.interrupted;
                    report.unreachable.push(failure);
                    if interrupted {
                        report.interrupted = true;
                        break;
                    }
                    continue;
                }
            };

            let quote = match parse_document(&body) {
                Ok(document) => extract(&document),
                Err(e) => {
                    warn!("could not parse response for {security}: {e}");
                    report.unparseable.push(security.clone());
                    continue;
                }
            };

            let now = (self.clock)();
            let record = QuoteRecord::new(
                &security.symbol,
                run_date,
                quote.nav_date,
                quote.price,
                quote.nav,
                collection_time(now.hour(), now.minute()),
            );
            self.store.append(&record)?;
            report.appended += 1;

            let fields = record.missing_fields();
            if fields.is_empty() {
                info!("{security}: price {:?}, NAV {:?}", record.price, record.nav);
            } else {
                report.missing.push(MissingFields {
                    security: security.clone(),
                    fields,
                });
            }
        }

        Ok(report)
    }
}
