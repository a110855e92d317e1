//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvRecordStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_inputs::{load_calendar, load_universe};
use crate::adapters::http_adapter::HttpQuoteSource;
use crate::domain::calendar::TradingCalendar;
use crate::domain::config::{AppConfig, build_app_config};
use crate::domain::error::CefnavError;
use crate::domain::fetcher::ResilientFetcher;
use crate::domain::orchestrator::FetchOrchestrator;
use crate::domain::pipeline::{CleanSummary, build_pool, clean_all};
use crate::domain::report::FetchReport;
use crate::domain::retry::{ExponentialBackoff, RetryPolicy, ThreadSleeper};
use crate::domain::security::{SecurityId, parse_security};
use crate::ports::record_store_port::RecordStore;

#[derive(Parser, Debug)]
#[command(name = "cefnav", about = "Closed-end fund price/NAV collector and cleaner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one quote per security and append it to its record store
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        /// Fetch a single EXCHANGE:SYMBOL instead of the configured universe
        #[arg(long)]
        security: Option<String>,
        /// Skip the randomized pause before each request
        #[arg(long)]
        no_throttle: bool,
    },
    /// Clean record stores into the computed directory
    Clean {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// List symbols that have a record store
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate configuration, trading calendar and universe
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Fetch {
            config,
            security,
            no_throttle,
        } => run_fetch(&config, security.as_deref(), no_throttle),
        Command::Clean { config, symbol } => run_clean(&config, symbol.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_app_config(path: &Path) -> Result<AppConfig, CefnavError> {
    info!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    build_app_config(&adapter)
}

/// An explicit `--security` wins, then `[universe] securities`, then the mapping file.
pub fn resolve_universe(
    app: &AppConfig,
    security_override: Option<&str>,
) -> Result<Vec<SecurityId>, CefnavError> {
    if let Some(token) = security_override {
        return Ok(vec![parse_security(token)?]);
    }
    if let Some(securities) = &app.securities {
        return Ok(securities.clone());
    }
    if let Some(path) = &app.paths.universe_file {
        return load_universe(path);
    }
    Err(CefnavError::ConfigMissing {
        section: "universe".into(),
        key: "securities".into(),
    })
}

pub fn load_trading_calendar(app: &AppConfig) -> Result<TradingCalendar, CefnavError> {
    let path = app
        .paths
        .trading_days
        .as_ref()
        .ok_or_else(|| CefnavError::ConfigMissing {
            section: "paths".into(),
            key: "trading_days".into(),
        })?;
    let calendar = load_calendar(path)?;
    if calendar.is_empty() {
        return Err(CefnavError::ConfigInvalid {
            section: "paths".into(),
            key: "trading_days".into(),
            reason: format!("{} lists no trading days", path.display()),
        });
    }
    Ok(calendar)
}

pub fn record_store(app: &AppConfig) -> CsvRecordStore {
    CsvRecordStore::new(
        app.paths.fund_data_dir.clone(),
        app.paths.computed_dir.clone(),
    )
}

fn build_fetcher(app: &AppConfig) -> Result<ResilientFetcher, CefnavError> {
    let backoff = ExponentialBackoff::new(app.fetch.backoff_rate, app.fetch.backoff_unit)
        .map_err(|e| CefnavError::ConfigInvalid {
            section: "fetch".into(),
            key: "backoff_rate".into(),
            reason: e.to_string(),
        })?;
    Ok(ResilientFetcher::new(
        RetryPolicy::new(app.fetch.max_attempts),
        Box::new(backoff),
        Arc::new(ThreadSleeper),
    ))
}

fn run_fetch(
    config_path: &Path,
    security_override: Option<&str>,
    no_throttle: bool,
) -> Result<ExitCode, CefnavError> {
    let app = load_app_config(config_path)?;
    let universe = resolve_universe(&app, security_override)?;
    fs::create_dir_all(&app.paths.fund_data_dir)?;

    let store = record_store(&app);
    let source = HttpQuoteSource::new(&app.fetch)?;
    let fetcher = build_fetcher(&app)?;

    info!(
        "Fetching {} securities from {} (max {} attempts each)",
        universe.len(),
        app.fetch.base_url,
        app.fetch.max_attempts
    );
    let report: FetchReport = FetchOrchestrator::new(
        &source,
        &store,
        fetcher,
        Box::new(|| Local::now().naive_local()),
    )
    .with_throttle(app.fetch.throttle && !no_throttle)
    .run(&universe)?;

    println!("{report}");
    Ok(ExitCode::SUCCESS)
}

/// Run the cleaning pipeline for every stored symbol (or just `symbol`).
pub fn clean_with(app: &AppConfig, symbol: Option<&str>) -> Result<CleanSummary, CefnavError> {
    let calendar = load_trading_calendar(app)?;
    if let Some((first, last)) = calendar.span() {
        info!(
            "Trading calendar: {} days, {} to {}",
            calendar.len(),
            first,
            last
        );
    }

    let store = record_store(app);
    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => store.list_symbols()?,
    };
    if symbols.is_empty() {
        warn!(
            "No record stores found in {}",
            app.paths.fund_data_dir.display()
        );
    }

    let pool = build_pool(app.clean_workers)?;
    info!(
        "Cleaning {} securities on {} workers",
        symbols.len(),
        pool.current_num_threads()
    );
    Ok(clean_all(&pool, &store, &store, &symbols, &calendar))
}

fn run_clean(config_path: &Path, symbol: Option<&str>) -> Result<ExitCode, CefnavError> {
    let app = load_app_config(config_path)?;
    let summary = clean_with(&app, symbol)?;

    for cleaned in &summary.cleaned {
        println!(
            "{}: {} records -> {} trading days",
            cleaned.symbol,
            cleaned.input_records,
            cleaned.records.len()
        );
    }
    for failure in &summary.failures {
        println!("{}: FAILED ({})", failure.symbol, failure.error);
    }
    println!(
        "Cleaned {} of {} securities into {}",
        summary.cleaned.len(),
        summary.cleaned.len() + summary.failures.len(),
        app.paths.computed_dir.display()
    );

    Ok(match summary.failures.first() {
        Some(failure) => (&failure.error).into(),
        None => ExitCode::SUCCESS,
    })
}

fn run_list_symbols(config_path: &Path) -> Result<ExitCode, CefnavError> {
    let app = load_app_config(config_path)?;
    let symbols = record_store(&app).list_symbols()?;

    if symbols.is_empty() {
        info!(
            "No record stores found in {}",
            app.paths.fund_data_dir.display()
        );
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        info!("{} symbols found", symbols.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_validate(config_path: &Path) -> Result<ExitCode, CefnavError> {
    let app = load_app_config(config_path)?;
    println!("fund data:     {}", app.paths.fund_data_dir.display());
    println!("computed:      {}", app.paths.computed_dir.display());
    println!(
        "fetch:         {} (max {} attempts, {}s timeout)",
        app.fetch.base_url,
        app.fetch.max_attempts,
        app.fetch.timeout.as_secs()
    );

    match resolve_universe(&app, None) {
        Ok(universe) => {
            let tokens: Vec<String> = universe.iter().map(|s| s.to_string()).collect();
            println!("universe:      {} ({})", universe.len(), tokens.join(", "));
        }
        Err(CefnavError::ConfigMissing { .. }) => {
            println!("universe:      not configured (fetch requires --security)");
        }
        Err(e) => return Err(e),
    }

    match app.paths.trading_days {
        Some(_) => {
            let calendar = load_trading_calendar(&app)?;
            println!("trading days:  {}", calendar.len());
        }
        None => println!("trading days:  not configured (clean is unavailable)"),
    }

    println!("Configuration is valid.");
    Ok(ExitCode::SUCCESS)
}
