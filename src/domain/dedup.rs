//! One record per trading date.

use crate::domain::quote::QuoteRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Keep, for each `quote_date`, the record with the greatest `time`.
///
/// Ties go to the record seen last in input order. Output is ascending by date.
pub fn dedup_on_date(records: Vec<QuoteRecord>) -> Vec<QuoteRecord> {
    let mut latest: BTreeMap<NaiveDate, QuoteRecord> = BTreeMap::new();
    for record in records {
        match latest.get(&record.quote_date) {
            Some(kept) if kept.time > record.time => {}
            _ => {
                latest.insert(record.quote_date, record);
            }
        }
    }
    latest.into_values().collect()
}
