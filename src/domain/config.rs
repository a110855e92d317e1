//! Application configuration built from the INI file.
//!
//! Everything a run needs is read here once and handed to components
//! explicitly; nothing downstream reaches back into the config file.

use crate::domain::error::CefnavError;
use crate::domain::retry::DEFAULT_MAX_ATTEMPTS;
use crate::domain::security::{SecurityId, parse_securities};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://cef.morningstar.com/cef-header";
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;
pub const DEFAULT_BACKOFF_RATE: f64 = 1.0;
pub const DEFAULT_BACKOFF_UNIT_MS: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct PathSettings {
    pub fund_data_dir: PathBuf,
    pub computed_dir: PathBuf,
    pub trading_days: Option<PathBuf>,
    pub universe_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub base_url: String,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff_rate: f64,
    pub backoff_unit: Duration,
    pub throttle: bool,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub paths: PathSettings,
    pub fetch: FetchSettings,
    /// 0 means one worker per available core.
    pub clean_workers: usize,
    /// Securities listed inline under `[universe]`, if any.
    pub securities: Option<Vec<SecurityId>>,
}

pub fn build_app_config(config: &dyn ConfigPort) -> Result<AppConfig, CefnavError> {
    Ok(AppConfig {
        paths: build_paths(config)?,
        fetch: build_fetch(config)?,
        clean_workers: build_workers(config)?,
        securities: build_securities(config)?,
    })
}

fn build_paths(config: &dyn ConfigPort) -> Result<PathSettings, CefnavError> {
    let fund_data_dir = config
        .get_value("paths", "fund_data_dir")
        .map(PathBuf::from)
        .ok_or_else(|| CefnavError::ConfigMissing {
            section: "paths".into(),
            key: "fund_data_dir".into(),
        })?;

    let computed_dir = match optional_path(config, "computed_dir") {
        Some(dir) => dir,
        None => fund_data_dir
            .parent()
            .map(|p| p.join("computed"))
            .unwrap_or_else(|| PathBuf::from("computed")),
    };

    if computed_dir == fund_data_dir {
        return Err(invalid(
            "paths",
            "computed_dir",
            "computed_dir must differ from fund_data_dir",
        ));
    }

    Ok(PathSettings {
        fund_data_dir,
        computed_dir,
        trading_days: optional_path(config, "trading_days"),
        universe_file: optional_path(config, "universe_file"),
    })
}

fn optional_path(config: &dyn ConfigPort, key: &str) -> Option<PathBuf> {
    config.get_value("paths", key).map(PathBuf::from)
}

fn build_fetch(config: &dyn ConfigPort) -> Result<FetchSettings, CefnavError> {
    let max_attempts = config.get_int("fetch", "max_attempts", i64::from(DEFAULT_MAX_ATTEMPTS));
    if !(1..=i64::from(u32::MAX)).contains(&max_attempts) {
        return Err(invalid("fetch", "max_attempts", "max_attempts must be at least 1"));
    }

    let timeout_secs = config.get_int("fetch", "timeout_secs", DEFAULT_TIMEOUT_SECS);
    if timeout_secs <= 0 {
        return Err(invalid("fetch", "timeout_secs", "timeout_secs must be positive"));
    }

    let backoff_rate = config.get_double("fetch", "backoff_rate", DEFAULT_BACKOFF_RATE);
    if !backoff_rate.is_finite() || backoff_rate <= 0.0 {
        return Err(invalid("fetch", "backoff_rate", "backoff_rate must be positive"));
    }

    let backoff_unit_ms = config.get_int("fetch", "backoff_unit_ms", DEFAULT_BACKOFF_UNIT_MS);
    if backoff_unit_ms < 0 {
        return Err(invalid(
            "fetch",
            "backoff_unit_ms",
            "backoff_unit_ms must be non-negative",
        ));
    }

    Ok(FetchSettings {
        base_url: config
            .get_value("fetch", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        max_attempts: max_attempts as u32,
        timeout: Duration::from_secs(timeout_secs as u64),
        backoff_rate,
        backoff_unit: Duration::from_millis(backoff_unit_ms as u64),
        throttle: config.get_bool("fetch", "throttle", true),
        user_agent: config.get_value("fetch", "user_agent"),
    })
}

fn build_workers(config: &dyn ConfigPort) -> Result<usize, CefnavError> {
    let workers = config.get_int("clean", "workers", 0);
    if workers < 0 {
        return Err(invalid("clean", "workers", "workers must be non-negative"));
    }
    Ok(workers as usize)
}

fn build_securities(config: &dyn ConfigPort) -> Result<Option<Vec<SecurityId>>, CefnavError> {
    match config.get_value("universe", "securities") {
        Some(list) => Ok(Some(parse_securities(&list)?)),
        None => Ok(None),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> CefnavError {
    CefnavError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
