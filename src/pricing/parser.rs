//! Localized price text → USD range.

use super::formats::{CurrencyFormatRule, FormatRegistry};
use super::rates::{round_cents, RateTable};
use crate::error::ParseError;
use regex_lite::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use tracing::{trace, warn};

/// Suffix storefronts append to consumable offers.
const PER_ITEM: &str = "per item";

/// Markers meaning the text is already denominated in dollars.
const USD_MARKERS: &[&str] = &["USD", "US$"];

/// Characters accepted as a range separator between two prices.
const RANGE_DASHES: &[char] = &['-', '\u{2013}', '\u{2014}'];

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9][0-9.,]*").unwrap());

/// Smallest value a quote may carry.
pub const PRICE_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Separators whose role depends on where they sit in the number.
const AMBIGUOUS_SEPARATORS: &[char] = &['.', ','];

/// Which currency a parsed amount is denominated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denomination {
    /// Needs conversion from this currency.
    Local(String),
    /// Already USD; conversion is skipped.
    Usd,
}

/// Amounts read from a price token before conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAmounts {
    pub min: Decimal,
    pub max: Decimal,
    pub denomination: Denomination,
}

/// Turns storefront price strings into rounded USD ranges.
///
/// Cheap to clone; the registry and the rate table are shared read-only.
#[derive(Debug, Clone)]
pub struct PriceTextParser {
    formats: Arc<FormatRegistry>,
    rates: Arc<RateTable>,
}

impl PriceTextParser {
    pub fn new(formats: Arc<FormatRegistry>, rates: Arc<RateTable>) -> Self {
        Self { formats, rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Parses `raw_text` into a `(min, max)` USD pair.
    ///
    /// Never fails: a malformed token is logged and yields `(0, 0)`.
    pub fn parse_quote(&self, raw_text: &str, currency_code: &str) -> (Decimal, Decimal) {
        match self.try_parse_quote(raw_text, currency_code) {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Could not parse {} price '{}': {}", currency_code, raw_text, e);
                (Decimal::ZERO, Decimal::ZERO)
            }
        }
    }

    /// Parses `raw_text` into a `(min, max)` USD pair, reporting failures.
    ///
    /// Both bounds are rounded to cents and floored at 0.01; `min <= max`.
    pub fn try_parse_quote(
        &self,
        raw_text: &str,
        currency_code: &str,
    ) -> Result<(Decimal, Decimal), ParseError> {
        let amounts = self.parse_amounts(raw_text, currency_code)?;

        let convert = |amount: Decimal| -> Result<Decimal, ParseError> {
            let usd = match &amounts.denomination {
                Denomination::Usd => amount,
                Denomination::Local(code) => {
                    self.rates.to_usd(amount, code).ok_or_else(|| ParseError::OutOfRange {
                        amount: amount.to_string(),
                        currency: code.clone(),
                    })?
                }
            };
            Ok(round_cents(usd).max(PRICE_FLOOR))
        };

        let (min, max) = (convert(amounts.min)?, convert(amounts.max)?);
        trace!("{} '{}' -> {} .. {} USD", currency_code, raw_text, min, max);

        Ok(if min <= max { (min, max) } else { (max, min) })
    }

    /// Reads the numeric bounds out of `raw_text` without converting them.
    pub fn parse_amounts(
        &self,
        raw_text: &str,
        currency_code: &str,
    ) -> Result<LocalAmounts, ParseError> {
        let text = normalize(raw_text);

        let (rule, denomination) = if has_usd_marker(&text) {
            (self.formats.rule_for("USD"), Denomination::Usd)
        } else {
            let rule = self.formats.rule_for(currency_code);
            let denomination = if rule.preconverted_to_usd {
                Denomination::Usd
            } else {
                Denomination::Local(currency_code.to_uppercase())
            };
            (rule, denomination)
        };

        let (min, max) = match split_range(&text)? {
            Some((low, high)) => (read_amount(low, rule)?, read_amount(high, rule)?),
            None => {
                let amount = read_amount(&text, rule)?;
                (amount, amount)
            }
        };

        Ok(LocalAmounts { min, max, denomination })
    }
}

/// Unifies spacing and drops the trailing "per item" marker.
fn normalize(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{2009}' => ' ',
            other => other,
        })
        .collect();

    let trimmed = spaced.trim();
    // ASCII lowercasing keeps byte offsets aligned with `trimmed`
    let lower = trimmed.to_ascii_lowercase();
    let without_suffix = match lower.rfind(PER_ITEM) {
        Some(idx) if lower[idx + PER_ITEM.len()..].trim().is_empty() => &trimmed[..idx],
        _ => trimmed,
    };

    without_suffix.trim().to_string()
}

fn has_usd_marker(text: &str) -> bool {
    USD_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Splits "a - b" into its bounds.
///
/// A dash only separates a range once a digit has been seen, so prefixes
/// such as a hyphenated currency label stay attached to the first bound.
fn split_range(text: &str) -> Result<Option<(&str, &str)>, ParseError> {
    let mut seen_digit = false;
    let mut cuts = Vec::new();

    for (idx, c) in text.char_indices() {
        if c.is_numeric() {
            seen_digit = true;
        } else if seen_digit && RANGE_DASHES.contains(&c) {
            cuts.push((idx, c.len_utf8()));
        }
    }

    match cuts.as_slice() {
        [] => Ok(None),
        [(idx, len)] => {
            let (low, high) = (&text[..*idx], &text[idx + len..]);
            if !high.chars().any(char::is_numeric) {
                return Err(ParseError::InvalidRange(text.to_string()));
            }
            Ok(Some((low.trim(), high.trim())))
        }
        _ => Err(ParseError::InvalidRange(text.to_string())),
    }
}

/// Applies `rule` to one price token and reads the number.
fn read_amount(token: &str, rule: &CurrencyFormatRule) -> Result<Decimal, ParseError> {
    let mut text = token.to_string();

    for strip in &rule.strip_substrings {
        text = text.replace(strip.as_str(), "");
    }

    if let Some(system) = rule.digit_system {
        text = system.remap(&text);
    }

    // Glyphs other than '.' and ',' mean the same thing wherever they appear
    if let Some(decimal) = rule.decimal_separator.filter(|c| !AMBIGUOUS_SEPARATORS.contains(c)) {
        text = text.replace(decimal, ".");
    }
    if let Some(thousands) = rule.thousands_separator.filter(|c| !AMBIGUOUS_SEPARATORS.contains(c)) {
        text = text.replace(thousands, "");
    }

    let number = if rule.first_number_only {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        FIRST_NUMBER
            .find(&compact)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ParseError::NoDigits(token.to_string()))?
    } else {
        text.chars().filter(|c| c.is_ascii_digit() || AMBIGUOUS_SEPARATORS.contains(c)).collect()
    };

    // Leftovers of abbreviations like "Rs." around the number
    let number = number.trim_matches(AMBIGUOUS_SEPARATORS);

    if !number.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseError::NoDigits(token.to_string()));
    }

    let invalid =
        || ParseError::InvalidNumber { raw: token.to_string(), cleaned: number.to_string() };
    let cleaned = resolve_separators(number, rule).ok_or_else(invalid)?;
    let mut amount = Decimal::from_str(&cleaned).map_err(|_| invalid())?;

    if let Some(divisor) = rule.minor_unit_divisor.filter(|d| *d > 1) {
        amount /= Decimal::from(divisor);
    }

    Ok(amount)
}

/// Rewrites `number` (digits, '.' and ',') with '.' as the only separator.
///
/// The same storefront may render a currency in its local style ("1.299,99")
/// or in English style ("1,299.99"), so the glyphs are told apart by position:
/// - both present: the rightmost one is the decimal point;
/// - one glyph repeated: it groups digits, and the last group has three digits;
/// - one glyph once: it groups thousands only if exactly three digits follow it
///   and it is ',' or the rule's thousands separator.
///
/// Returns `None` when the layout cannot be a price.
fn resolve_separators(number: &str, rule: &CurrencyFormatRule) -> Option<String> {
    let Some(last_idx) = number.rfind(AMBIGUOUS_SEPARATORS) else {
        return Some(number.to_string());
    };
    let last = if number[last_idx..].starts_with('.') { '.' } else { ',' };
    let other = if last == '.' { ',' } else { '.' };

    if number.contains(other) {
        if number.matches(last).count() > 1 {
            return None;
        }
        return Some(number.replace(other, "").replace(last, "."));
    }

    let groups: Vec<&str> = number.split(last).collect();
    if let [_, middle @ .., tail] = groups.as_slice() {
        if !middle.is_empty() {
            // Lakh grouping ("1,00,000") uses two-digit middle groups
            let grouped = tail.len() == 3 && middle.iter().all(|g| g.len() == 2 || g.len() == 3);
            return grouped.then(|| groups.concat());
        }

        let groups_thousands = last == ',' || rule.thousands_separator == Some(last);
        if tail.len() == 3 && groups_thousands {
            return Some(groups.concat());
        }
    }

    Some(number.replace(last, "."))
}
