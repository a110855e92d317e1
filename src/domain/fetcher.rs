//! Resilient fetcher: one security's quote page, retried through transient failures.

use crate::domain::error::FetchError;
use crate::domain::retry::{Backoff, RetryPolicy, Sleeper};
use crate::domain::security::SecurityId;
use crate::ports::quote_source_port::QuoteSource;
use log::debug;
use std::sync::Arc;

/// Every attempt for a security failed. Non-fatal: the security is skipped for this run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("giving up on {security} after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    pub security: SecurityId,
    pub attempts: u32,
    pub last_error: FetchError,
    pub interrupted: bool,
}

pub struct ResilientFetcher {
    policy: RetryPolicy,
    backoff: Box<dyn Backoff>,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientFetcher {
    pub fn new(policy: RetryPolicy, backoff: Box<dyn Backoff>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            backoff,
            sleeper,
        }
    }

    pub fn fetch(
        &mut self,
        source: &dyn QuoteSource,
        security: &SecurityId,
    ) -> Result<String, FetchFailure> {
        self.policy
            .run(self.backoff.as_mut(), self.sleeper.as_ref(), |attempt| {
                debug!("fetching {security} (attempt {attempt})");
                source.fetch_page(security)
            })
            .map_err(|exhausted| FetchFailure {
                security: security.clone(),
                attempts: exhausted.attempts,
                last_error: exhausted.last_error,
                interrupted: exhausted.interrupted,
            })
    }

    /// Wait one backoff-distributed interval. Returns `false` if interrupted.
    pub fn pause(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        debug!("throttling for {:.2}s", delay.as_secs_f64());
        self.sleeper.sleep(delay)
    }
}
