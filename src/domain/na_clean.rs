//! Missing-value cleanup for a security's history.

use crate::domain::quote::QuoteRecord;

/// Drop records with neither price nor NAV, then forward-fill each field.
///
/// The fill follows input order, so callers must pass records sorted
/// chronologically. Leading gaps stay `None`.
pub fn clean_nas(records: Vec<QuoteRecord>) -> Vec<QuoteRecord> {
    let mut out: Vec<QuoteRecord> = records
        .into_iter()
        .filter(|r| r.price.is_some() || r.nav.is_some())
        .collect();

    forward_fill(&mut out, |r| &mut r.nav);
    forward_fill(&mut out, |r| &mut r.price);
    out
}

fn forward_fill<F>(records: &mut [QuoteRecord], mut field: F)
where
    F: FnMut(&mut QuoteRecord) -> &mut Option<f64>,
{
    let mut last = None;
    for record in records.iter_mut() {
        let value = field(record);
        if value.is_some() {
            last = *value;
        } else {
            *value = last;
        }
    }
}
