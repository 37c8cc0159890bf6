//! Static exchange rate table and USD conversion.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};

/// Units of currency per 1 USD, as (code, mantissa, scale).
///
/// Snapshot shipped with the tool; override entries through the `[rates]`
/// table of the config file.
const BUILTIN_RATES: &[(&str, i64, u32)] = &[
    ("AED", 367, 2),
    ("AUD", 153, 2),
    ("BDT", 10973, 2),
    ("BHD", 376, 3),
    ("BOB", 691, 2),
    ("BRL", 497, 2),
    ("CAD", 135, 2),
    ("CLP", 97001, 2),
    ("COP", 39024, 1),
    ("CRC", 51506, 2),
    ("DZD", 13455, 2),
    ("EGP", 309, 1),
    ("EUR", 92, 2),
    ("GEL", 264, 2),
    ("GHS", 1249, 2),
    ("HKD", 782, 2),
    ("IDR", 1564673, 2),
    ("ILS", 361, 2),
    ("INR", 8305, 2),
    ("IQD", 130963, 2),
    ("JOD", 709, 3),
    ("JPY", 1502, 1),
    ("KES", 1469, 1),
    ("KHR", 4100, 0),
    ("KRW", 133297, 2),
    ("KWD", 308, 3),
    ("KYD", 833, 3),
    ("KZT", 45004, 2),
    ("LKR", 31229, 2),
    ("MAD", 1006, 2),
    ("MMK", 209453, 2),
    ("MOP", 806, 2),
    ("MXN", 1706, 2),
    ("MYR", 478, 2),
    ("NGN", 150532, 2),
    ("NZD", 163, 2),
    ("OMR", 384, 3),
    ("PAB", 1, 0),
    ("PEN", 384, 2),
    ("PHP", 5594, 2),
    ("PKR", 27929, 2),
    ("PYG", 729836, 2),
    ("QAR", 364, 2),
    ("RSD", 10877, 2),
    ("RUB", 9212, 2),
    ("SAR", 375, 2),
    ("SGD", 135, 2),
    ("THB", 36, 0),
    ("TRY", 3087, 2),
    ("TWD", 3133, 2),
    ("TZS", 254115, 2),
    ("UAH", 3796, 2),
    ("USD", 1, 0),
    ("VND", 2452638, 2),
    ("ZAR", 1888, 2),
];

/// Rounds a monetary value to cents, half away from zero.
///
/// The result always carries two decimal places, so `1` displays as `1.00`.
pub fn round_cents(value: Decimal) -> Decimal {
    let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

/// Read-only currency → rate mapping; USD is always 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// Table with the bundled snapshot.
    pub fn builtin() -> Self {
        Self::from_pairs(
            BUILTIN_RATES.iter().map(|(code, mantissa, scale)| (*code, Decimal::new(*mantissa, *scale))),
        )
    }

    /// Table with exactly the given rates (plus USD = 1).
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut rates: HashMap<String, Decimal> =
            pairs.into_iter().map(|(code, rate)| (code.as_ref().to_uppercase(), rate)).collect();
        rates.insert("USD".to_string(), Decimal::ONE);
        Self { rates }
    }

    /// Returns a copy with `overrides` replacing or adding entries. USD stays 1.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Decimal>) -> Self {
        for (code, rate) in overrides {
            let code = code.to_uppercase();
            if code != "USD" {
                self.rates.insert(code, *rate);
            }
        }
        self
    }

    /// Units of `currency_code` per 1 USD, if known.
    pub fn rate(&self, currency_code: &str) -> Option<Decimal> {
        self.rates.get(&currency_code.to_uppercase()).copied()
    }

    /// Converts an amount in `currency_code` to USD (unrounded).
    ///
    /// Unknown currencies and zero rates convert at 1. Returns `None` when the
    /// quotient does not fit a `Decimal`.
    pub fn to_usd(&self, amount: Decimal, currency_code: &str) -> Option<Decimal> {
        match self.rate(currency_code) {
            Some(rate) if !rate.is_zero() => amount.checked_div(rate),
            _ => Some(amount),
        }
    }

    /// Converts a USD amount into `currency_code`, rounded to cents.
    ///
    /// `None` if the currency is unknown or the product overflows.
    pub fn from_usd(&self, usd: Decimal, currency_code: &str) -> Option<Decimal> {
        let rate = self.rate(currency_code)?;
        usd.checked_mul(rate).map(round_cents)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_builtin_rates() {
        let table = RateTable::builtin();
        assert_eq!(table.rate("USD"), Some(Decimal::ONE));
        assert_eq!(table.rate("JPY"), Some(dec("150.2")));
        assert_eq!(table.rate("IDR"), Some(dec("15646.73")));
        assert_eq!(table.rate("jod"), Some(dec("0.709")));
        assert_eq!(table.rate("XXX"), None);
        assert_eq!(table.len(), BUILTIN_RATES.len());
    }

    #[test]
    fn test_to_usd() {
        let table = RateTable::from_pairs([("JPY", dec("155.85"))]);
        assert_eq!(table.to_usd(dec("500"), "JPY").map(round_cents), Some(dec("3.21")));
        assert_eq!(table.to_usd(dec("4.99"), "USD"), Some(dec("4.99")));
    }

    #[test]
    fn test_to_usd_unknown_or_zero_rate_is_identity() {
        let table = RateTable::from_pairs([("ABC", Decimal::ZERO)]);
        assert_eq!(table.to_usd(dec("12.5"), "ABC"), Some(dec("12.5")));
        assert_eq!(table.to_usd(dec("12.5"), "XYZ"), Some(dec("12.5")));
    }

    #[test]
    fn test_conversion_overflow_is_none() {
        let tiny = Decimal::new(1, 27);
        let table = RateTable::from_pairs([("XAU", tiny), ("XAG", Decimal::MAX)]);
        assert_eq!(table.to_usd(Decimal::new(1_000_000, 0), "XAU"), None);
        assert_eq!(table.from_usd(dec("2"), "XAG"), None);
    }

    #[test]
    fn test_usd_is_always_one() {
        let table = RateTable::from_pairs([("USD", dec("3"))]);
        assert_eq!(table.rate("USD"), Some(Decimal::ONE));

        let mut overrides = BTreeMap::new();
        overrides.insert("usd".to_string(), dec("2"));
        overrides.insert("idr".to_string(), dec("16149.39"));
        let table = RateTable::builtin().with_overrides(&overrides);
        assert_eq!(table.rate("USD"), Some(Decimal::ONE));
        assert_eq!(table.rate("IDR"), Some(dec("16149.39")));
    }

    #[test]
    fn test_from_usd() {
        let table = RateTable::from_pairs([("RUB", dec("92.12"))]);
        assert_eq!(table.from_usd(dec("1.99"), "RUB"), Some(dec("183.32")));
        assert_eq!(table.from_usd(dec("1.99"), "XYZ"), None);
    }

    #[test]
    fn test_round_cents_midpoint() {
        assert_eq!(round_cents(dec("1")).to_string(), "1.00");
        assert_eq!(round_cents(dec("905.0")).to_string(), "905.00");
        assert_eq!(round_cents(dec("0.125")), dec("0.13"));
        assert_eq!(round_cents(dec("0.124")), dec("0.12"));
        assert_eq!(round_cents(dec("3.2082")), dec("3.21"));
    }
}
