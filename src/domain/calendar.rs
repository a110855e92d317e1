//! Official trading-day calendar.

use crate::domain::error::CalendarError;
use crate::domain::quote::DATE_FORMAT;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Immutable set of open trading days. Shared read-only across cleaning tasks.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    days: HashSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(days: I) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Parse one `MM/DD/YYYY` date per line. Blank lines are skipped.
    pub fn parse(content: &str) -> Result<Self, CalendarError> {
        let mut days = HashSet::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let day = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
                CalendarError::InvalidDate {
                    line: idx + 1,
                    value: trimmed.to_string(),
                }
            })?;
            days.insert(day);
        }
        Ok(Self { days })
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Earliest and latest trading day, if any.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.days.iter().min()?;
        let max = self.days.iter().max()?;
        Some((*min, *max))
    }
}
