//! Quote record representation and derived premium/discount fields.

use chrono::NaiveDate;
use std::fmt;

/// Date format used by the provider, the record store and the trading calendar.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Collection time for one shifted day.
pub const DAY_SHIFT: i64 = 2400;

/// One row of a security's record store.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub symbol: String,
    pub quote_date: NaiveDate,
    /// As-of date of the NAV, verbatim from the provider.
    pub nav_date: Option<String>,
    pub price: Option<f64>,
    pub nav: Option<f64>,
    pub premium_discount: Option<f64>,
    pub premium_discount_pct: Option<f64>,
    pub reserved1: Option<f64>,
    pub reserved2: Option<f64>,
    /// hour*100 + minute at collection; an ordering key once normalized.
    pub time: i64,
}

impl QuoteRecord {
    /// Build a fresh record, deriving premium/discount from price and NAV.
    pub fn new(
        symbol: &str,
        quote_date: NaiveDate,
        nav_date: Option<String>,
        price: Option<f64>,
        nav: Option<f64>,
        time: i64,
    ) -> Self {
        let premium_discount = premium_discount(price, nav);
        Self {
            symbol: symbol.to_string(),
            quote_date,
            nav_date,
            price,
            nav,
            premium_discount,
            premium_discount_pct: premium_discount_pct(premium_discount, nav),
            reserved1: None,
            reserved2: None,
            time,
        }
    }

    pub fn quote_date_string(&self) -> String {
        self.quote_date.format(DATE_FORMAT).to_string()
    }

    /// Fields that could not be extracted or derived for this record.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.price.is_none() {
            missing.push(MissingField::Price);
        }
        if self.nav.is_none() {
            missing.push(MissingField::Nav);
        }
        if self.nav_date.is_none() {
            missing.push(MissingField::NavDate);
        }
        if self.premium_discount.is_none() {
            missing.push(MissingField::PremiumDiscount);
        }
        if self.premium_discount_pct.is_none() {
            missing.push(MissingField::PremiumDiscountPct);
        }
        missing
    }
}

/// price - nav, or None if either side is missing.
pub fn premium_discount(price: Option<f64>, nav: Option<f64>) -> Option<f64> {
    Some(price? - nav?)
}

/// premium_discount / nav, or None if either is missing or nav is zero.
pub fn premium_discount_pct(premium_discount: Option<f64>, nav: Option<f64>) -> Option<f64> {
    let pd = premium_discount?;
    let nav = nav?;
    if nav == 0.0 {
        return None;
    }
    Some(pd / nav)
}

/// Minutes-resolution collection time, hour*100 + minute.
pub fn collection_time(hour: u32, minute: u32) -> i64 {
    i64::from(hour) * 100 + i64::from(minute)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MissingField {
    Price,
    Nav,
    NavDate,
    PremiumDiscount,
    PremiumDiscountPct,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Price => "price",
            MissingField::Nav => "NAV",
            MissingField::NavDate => "last NAV date",
            MissingField::PremiumDiscount => "premium/discount",
            MissingField::PremiumDiscountPct => "premium/discount %",
        };
        f.write_str(name)
    }
}
