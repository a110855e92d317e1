//! Per-run missing-field report.

use crate::domain::fetcher::FetchFailure;
use crate::domain::quote::MissingField;
use crate::domain::security::SecurityId;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct MissingFields {
    pub security: SecurityId,
    pub fields: Vec<MissingField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub run_date: NaiveDate,
    pub attempted: usize,
    pub appended: usize,
    pub missing: Vec<MissingFields>,
    pub unreachable: Vec<FetchFailure>,
    pub unparseable: Vec<SecurityId>,
    /// The run stopped early because a wait was interrupted.
    pub interrupted: bool,
}

impl FetchReport {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            attempted: 0,
            appended: 0,
            missing: Vec::new(),
            unreachable: Vec::new(),
            unparseable: Vec::new(),
            interrupted: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
            && self.unreachable.is_empty()
            && self.unparseable.is_empty()
            && !self.interrupted
    }
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Fetch run {}: {} of {} securities recorded",
            self.run_date.format("%m/%d/%Y"),
            self.appended,
            self.attempted
        )?;

        writeln!(f, "Could not extract the following fields:")?;
        for entry in &self.missing {
            let names: Vec<String> = entry.fields.iter().map(|m| m.to_string()).collect();
            writeln!(f, "{}: {}", entry.security.symbol, names.join(","))?;
        }

        if !self.unreachable.is_empty() {
            writeln!(f, "Could not open URL for:")?;
            for failure in &self.unreachable {
                writeln!(
                    f,
                    "{} ({} attempt(s): {})",
                    failure.security.symbol, failure.attempts, failure.last_error
                )?;
            }
        }

        if !self.unparseable.is_empty() {
            writeln!(f, "Could not parse response for:")?;
            for security in &self.unparseable {
                writeln!(f, "{}", security.symbol)?;
            }
        }

        if self.interrupted {
            writeln!(f, "Run interrupted before all securities were fetched")?;
        }
        Ok(())
    }
}
