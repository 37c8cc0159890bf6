//! Markers and patterns for reading storefront responses.
//!
//! Everything that depends on the storefront's markup or API shape lives
//! here. Update this file when a storefront changes its page structure.

use crate::storefront::fetcher::RawOffer;
use regex_lite::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::trace;

/// Body text of the storefront's "not found" page.
pub const NOT_FOUND_MARKER: &str = "We're sorry, the requested URL was not found on this server.";

/// Section heading present only on listings that sell in-app items.
pub const OFFER_MARKER: &str = "In-app purchases";

/// Price patterns, tried in order; the first one with any match wins.
static PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""([^"]*?\sper\sitem)""#,
        r#""([^"]*?)"[^>]*?>\s*per item"#,
        r#">([^<]*?\sper\sitem)<"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Dollar ranges without the "per item" suffix, used when nothing else matched.
static DOLLAR_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(\$[\d,.]+ - \$[\d,.]+)""#).unwrap());

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

/// Result of reading an API document.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiListing {
    NotFound,
    Offers { offers: Vec<RawOffer>, app_title: Option<String> },
}

pub fn is_not_found_page(body: &str) -> bool {
    body.contains(NOT_FOUND_MARKER)
}

pub fn has_offer_marker(body: &str) -> bool {
    body.contains(OFFER_MARKER)
}

/// Collects every "... per item" price text in page order.
///
/// Repeated texts are reported once, at their first position.
pub fn price_tokens(body: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();

    for pattern in PRICE_PATTERNS.iter() {
        for caps in pattern.captures_iter(body) {
            if let Some(m) = caps.get(1) {
                push_token(&mut tokens, unescape(m.as_str().trim()));
            }
        }
        if !tokens.is_empty() {
            trace!("Price pattern {} matched {} tokens", pattern.as_str(), tokens.len());
            return tokens;
        }
    }

    for caps in DOLLAR_RANGE.captures_iter(body) {
        if let Some(m) = caps.get(1) {
            push_token(&mut tokens, format!("{} per item", m.as_str()));
        }
    }

    tokens
}

fn push_token(tokens: &mut Vec<String>, token: String) {
    if !token.is_empty() && !tokens.contains(&token) {
        tokens.push(token);
    }
}

/// Decodes the few entities that show up inside price text.
fn unescape(text: &str) -> String {
    text.replace("&nbsp;", "\u{a0}")
        .replace("&#160;", "\u{a0}")
        .replace("\\u00a0", "\u{a0}")
        .replace("&amp;", "&")
}

/// Listing title from the page's first `h1`.
pub fn app_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    document
        .select(&TITLE)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Reads an offer API document.
///
/// Expected shape: `{"title": .., "offers": [{"name", "price", "duration"}]}`,
/// or `{"error": "... not found ..."}` for unknown apps.
pub fn api_listing(doc: &Value) -> ApiListing {
    if let Some(error) = doc.get("error").and_then(Value::as_str) {
        if error.to_lowercase().contains("not found") {
            return ApiListing::NotFound;
        }
    }

    let offers = doc
        .get("offers")
        .and_then(Value::as_array)
        .map(|records| records.iter().filter_map(offer_record).collect())
        .unwrap_or_default();

    let app_title = doc
        .get("title")
        .and_then(Value::as_str)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    ApiListing::Offers { offers, app_title }
}

fn offer_record(record: &Value) -> Option<RawOffer> {
    let price_text = record.get("price").and_then(Value::as_str)?.trim();
    if price_text.is_empty() {
        return None;
    }

    let text_field = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(RawOffer {
        price_text: price_text.to_string(),
        name: text_field("name"),
        duration: text_field("duration"),
    })
}
