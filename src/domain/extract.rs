//! Quote extraction from the provider's quote-header markup.
//!
//! The page carries the last price in `div#lastPrice` and the last NAV in
//! `td#last-act-nav`, with the NAV's as-of date in the next sibling cell.
//! Each field degrades to `None` on its own; nothing here returns an error
//! for a missing or malformed element.

use scraper::{ElementRef, Html, Selector};

const PRICE_SELECTOR: &str = "div#lastPrice";
const NAV_SELECTOR: &str = "td#last-act-nav";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedQuote {
    pub price: Option<f64>,
    pub nav: Option<f64>,
    /// Provider-formatted as-of date, kept verbatim.
    pub nav_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("empty response body")]
    Empty,
}

/// Parse a raw response body. Markup need not be well-formed.
pub fn parse_document(body: &str) -> Result<Html, DocumentError> {
    let cleaned: String = body.chars().filter(|c| *c != '\n' && *c != '\t').collect();
    if cleaned.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(Html::parse_document(&cleaned))
}

pub fn extract(document: &Html) -> ExtractedQuote {
    let price = select_first(document, PRICE_SELECTOR).and_then(|el| parse_number(&el));

    let Some(nav_cell) = select_first(document, NAV_SELECTOR) else {
        return ExtractedQuote {
            price,
            ..Default::default()
        };
    };
    let Some(nav) = parse_number(&nav_cell) else {
        return ExtractedQuote {
            price,
            ..Default::default()
        };
    };

    let nav_date = nav_cell
        .next_siblings()
        .find_map(ElementRef::wrap)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty());

    ExtractedQuote {
        price,
        nav: Some(nav),
        nav_date,
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn parse_number(el: &ElementRef<'_>) -> Option<f64> {
    element_text(el).parse::<f64>().ok().filter(|v| v.is_finite())
}
