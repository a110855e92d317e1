//! Date normalization against the trading calendar.
//!
//! Quotes collected on a weekend or holiday reflect the last published NAV,
//! which belongs to the preceding trading day. Each backward shift adds
//! [`DAY_SHIFT`] to the collection time so that, among records landing on the
//! same trading day, the most recently collected one still sorts last.

use crate::domain::calendar::TradingCalendar;
use crate::domain::error::CalendarError;
use crate::domain::quote::{DAY_SHIFT, QuoteRecord};
use chrono::Days;

/// Shifts allowed before the calendar is declared unusable.
pub const MAX_SHIFTS: u32 = 1000;

pub fn normalize_record(
    record: &QuoteRecord,
    calendar: &TradingCalendar,
) -> Result<QuoteRecord, CalendarError> {
    let mut out = record.clone();
    let mut shifts = 0u32;

    while !calendar.is_trading_day(out.quote_date) {
        if shifts >= MAX_SHIFTS {
            return Err(CalendarError::NoTradingDay {
                symbol: record.symbol.clone(),
                start: record.quote_date,
                shifts,
            });
        }
        out.quote_date = out
            .quote_date
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| CalendarError::NoTradingDay {
                symbol: record.symbol.clone(),
                start: record.quote_date,
                shifts,
            })?;
        out.time = record
            .time
            .checked_add(DAY_SHIFT * i64::from(shifts + 1))
            .ok_or_else(|| CalendarError::TimeOverflow {
                symbol: record.symbol.clone(),
                date: record.quote_date,
                time: record.time,
            })?;
        shifts += 1;
    }

    Ok(out)
}

pub fn normalize_all(
    records: &[QuoteRecord],
    calendar: &TradingCalendar,
) -> Result<Vec<QuoteRecord>, CalendarError> {
    records
        .iter()
        .map(|record| normalize_record(record, calendar))
        .collect()
}
