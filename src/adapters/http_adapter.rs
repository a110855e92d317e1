//! HTTP quote source backed by a blocking reqwest client.

use crate::domain::config::FetchSettings;
use crate::domain::error::{CefnavError, FetchError};
use crate::domain::security::SecurityId;
use crate::ports::quote_source_port::QuoteSource;
use chrono::Utc;
use reqwest::blocking::Client;

pub struct HttpQuoteSource {
    client: Client,
    base_url: String,
}

/// Quote-header URL. The trailing millisecond token defeats intermediate caches.
pub fn quote_url(base_url: &str, security: &SecurityId, epoch_ms: i64) -> String {
    format!(
        "{}?&t={}:{}&returnType=html&_={}",
        base_url, security.exchange, security.symbol, epoch_ms
    )
}

impl HttpQuoteSource {
    pub fn new(settings: &FetchSettings) -> Result<Self, CefnavError> {
        let mut builder = Client::builder().timeout(settings.timeout);
        if let Some(agent) = &settings.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        let client = builder.build().map_err(|e| {
            CefnavError::Io(std::io::Error::other(format!(
                "failed to build HTTP client: {e}"
            )))
        })?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }
}

impl QuoteSource for HttpQuoteSource {
    fn fetch_page(&self, security: &SecurityId) -> Result<String, FetchError> {
        let url = quote_url(&self.base_url, security, Utc::now().timestamp_millis());
        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|e| FetchError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn quote_url_encodes_exchange_symbol_and_timestamp() {
        let url = quote_url(
            "http://cef.morningstar.com/cef-header",
            &SecurityId::new("XNYS", "BME"),
            1427318398203,
        );
        assert_eq!(
            url,
            "http://cef.morningstar.com/cef-header?&t=XNYS:BME&returnType=html&_=1427318398203"
        );
    }

    #[test]
    fn client_builds_from_settings() {
        let settings = FetchSettings {
            base_url: "http://127.0.0.1:9".into(),
            max_attempts: 1,
            timeout: Duration::from_millis(200),
            backoff_rate: 1.0,
            backoff_unit: Duration::ZERO,
            throttle: false,
            user_agent: Some("cefnav-test".into()),
        };
        assert!(HttpQuoteSource::new(&settings).is_ok());
    }

    #[test]
    fn unreachable_host_is_a_fetch_error() {
        let settings = FetchSettings {
            base_url: "http://127.0.0.1:9/cef-header".into(),
            max_attempts: 1,
            timeout: Duration::from_millis(500),
            backoff_rate: 1.0,
            backoff_unit: Duration::ZERO,
            throttle: false,
            user_agent: None,
        };
        let source = HttpQuoteSource::new(&settings).unwrap();
        let err = source.fetch_page(&SecurityId::new("XNYS", "BME")).unwrap_err();
        assert!(matches!(err, FetchError::Transport(_) | FetchError::Timeout(_)));
    }
}
