//! Remote quote source port trait.

use crate::domain::error::FetchError;
use crate::domain::security::SecurityId;

/// One request against the remote quote endpoint. Retrying is the caller's job.
pub trait QuoteSource {
    fn fetch_page(&self, security: &SecurityId) -> Result<String, FetchError>;
}
