//! Per-currency price text cleanup rules.
//!
//! Each rule is plain data; [`crate::pricing::PriceTextParser`] is the only
//! interpreter. Supporting a new currency means adding a row to
//! [`BUILTIN_RULES`] (or a `[currency_formats.XXX]` table in the config file),
//! never new parsing code.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Non-Latin numeral systems that storefronts are known to render.
///
/// Every system listed here encodes 0-9 as ten consecutive code points, so
/// the mapping back to ASCII is just an offset from the zero glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigitSystem {
    /// ٠١٢٣٤٥٦٧٨٩
    ArabicIndic,
    /// ۰۱۲۳۴۵۶۷۸۹ (Persian, Urdu)
    ExtendedArabicIndic,
    /// ०१२३४५६७८९
    Devanagari,
    /// ০১২৩৪৫৬৭৮৯
    Bengali,
    /// ၀၁၂၃၄၅၆၇၈၉
    Myanmar,
    /// ០១២៣៤៥៦៧៨៩
    Khmer,
    /// ๐๑๒๓๔๕๖๗๘๙
    Thai,
}

impl DigitSystem {
    fn zero(&self) -> u32 {
        match self {
            DigitSystem::ArabicIndic => 0x0660,
            DigitSystem::ExtendedArabicIndic => 0x06F0,
            DigitSystem::Devanagari => 0x0966,
            DigitSystem::Bengali => 0x09E6,
            DigitSystem::Myanmar => 0x1040,
            DigitSystem::Khmer => 0x17E0,
            DigitSystem::Thai => 0x0E50,
        }
    }

    /// Maps a glyph of this numeral system to its ASCII digit.
    pub fn to_ascii(&self, c: char) -> Option<char> {
        let offset = (c as u32).checked_sub(self.zero())?;
        if offset < 10 {
            char::from_digit(offset, 10)
        } else {
            None
        }
    }

    /// Rewrites every glyph of this system in `text`, leaving other characters alone.
    pub fn remap(&self, text: &str) -> String {
        text.chars().map(|c| self.to_ascii(c).unwrap_or(c)).collect()
    }
}

impl fmt::Display for DigitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DigitSystem::ArabicIndic => "arabic-indic",
            DigitSystem::ExtendedArabicIndic => "extended-arabic-indic",
            DigitSystem::Devanagari => "devanagari",
            DigitSystem::Bengali => "bengali",
            DigitSystem::Myanmar => "myanmar",
            DigitSystem::Khmer => "khmer",
            DigitSystem::Thai => "thai",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DigitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arabic-indic" | "arabic" => Ok(DigitSystem::ArabicIndic),
            "extended-arabic-indic" | "persian" => Ok(DigitSystem::ExtendedArabicIndic),
            "devanagari" => Ok(DigitSystem::Devanagari),
            "bengali" => Ok(DigitSystem::Bengali),
            "myanmar" => Ok(DigitSystem::Myanmar),
            "khmer" => Ok(DigitSystem::Khmer),
            "thai" => Ok(DigitSystem::Thai),
            _ => Err(format!("Unknown digit system: {}", s)),
        }
    }
}

/// Cleanup steps that turn one currency's price text into a plain number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormatRule {
    /// Literal substrings removed before anything else (currency symbols, codes).
    pub strip_substrings: Vec<String>,

    /// Numeral system to translate into ASCII digits.
    pub digit_system: Option<DigitSystem>,

    /// Decimal separator in the currency's local style. Glyphs other than
    /// '.' and ',' are always read as the decimal point; those two are told
    /// apart by their position in the number.
    pub decimal_separator: Option<char>,

    /// Thousands separator in the currency's local style. A lone '.' followed
    /// by exactly three digits is only grouping when it is listed here.
    pub thousands_separator: Option<char>,

    /// Amount is already in USD and must not be converted.
    pub preconverted_to_usd: bool,

    /// Only the first run of digits and separators is read (after removing
    /// whitespace); otherwise every non-numeric character is dropped.
    pub first_number_only: bool,

    /// Parsed amount is in minor units and gets divided by this value before
    /// conversion. One historical storefront rendering of JOD needed 1000.
    pub minor_unit_divisor: Option<u32>,
}

impl CurrencyFormatRule {
    /// The fallback rule: first number in the text, ',' groups thousands.
    pub fn fallback() -> Self {
        Self { thousands_separator: Some(','), first_number_only: true, ..Self::default() }
    }
}

/// Static description of a built-in rule.
struct RuleSpec {
    currency: &'static str,
    strip: &'static [&'static str],
    digits: Option<DigitSystem>,
    decimal: Option<char>,
    thousands: Option<char>,
    preconverted: bool,
}

impl RuleSpec {
    const fn latin(
        currency: &'static str,
        strip: &'static [&'static str],
        decimal: Option<char>,
        thousands: Option<char>,
    ) -> Self {
        Self { currency, strip, digits: None, decimal, thousands, preconverted: false }
    }

    const fn native(
        currency: &'static str,
        strip: &'static [&'static str],
        digits: DigitSystem,
        decimal: char,
    ) -> Self {
        // Latin-digit renderings of the same currency still group with ','.
        Self {
            currency,
            strip,
            digits: Some(digits),
            decimal: Some(decimal),
            thousands: Some(','),
            preconverted: false,
        }
    }

    fn to_rule(&self) -> CurrencyFormatRule {
        CurrencyFormatRule {
            strip_substrings: self.strip.iter().map(|s| s.to_string()).collect(),
            digit_system: self.digits,
            decimal_separator: self.decimal,
            thousands_separator: self.thousands,
            preconverted_to_usd: self.preconverted,
            first_number_only: false,
            minor_unit_divisor: None,
        }
    }
}

const ARABIC_DECIMAL: char = '\u{066B}';

/// Currencies whose storefront text the fallback rule would misread.
const BUILTIN_RULES: &[RuleSpec] = &[
    RuleSpec::latin("USD", &["US$", "USD", "$"], None, Some(',')),
    RuleSpec::latin("AUD", &["A$", "AU$", "AUD", "$"], None, Some(',')),
    RuleSpec::latin("CAD", &["CA$", "CAD", "$"], None, Some(',')),
    RuleSpec::latin("NZD", &["NZ$", "NZD", "$"], None, Some(',')),
    RuleSpec::latin("SGD", &["SGD", "S$", "$"], None, Some(',')),
    RuleSpec::latin("HKD", &["HK$", "HKD"], None, Some(',')),
    RuleSpec::latin("TWD", &["NT$", "TWD"], None, Some(',')),
    RuleSpec::latin("JPY", &["¥", "￥", "JPY"], None, Some(',')),
    RuleSpec::latin("KRW", &["₩", "KRW"], None, Some(',')),
    RuleSpec::latin("INR", &["₹", "Rs.", "Rs", "INR"], None, Some(',')),
    RuleSpec::latin("ILS", &["₪", "ILS"], None, Some(',')),
    RuleSpec::latin("JOD", &["JOD", "JD"], None, Some(',')),
    RuleSpec::latin("ZAR", &["ZAR", "R"], None, Some(',')),
    RuleSpec::latin("IDR", &["Rp", "IDR"], Some(','), Some('.')),
    RuleSpec::latin("VND", &["₫", "VND"], Some(','), Some('.')),
    RuleSpec::latin("TRY", &["TRY", "₺", "TL"], Some(','), Some('.')),
    RuleSpec::latin("COP", &["COP", "$"], Some(','), Some('.')),
    RuleSpec::latin("CLP", &["CLP", "$"], Some(','), Some('.')),
    RuleSpec::latin("PYG", &["₲", "PYG", "Gs."], Some(','), Some('.')),
    RuleSpec::latin("BRL", &["R$", "BRL"], Some(','), Some('.')),
    RuleSpec::latin("RSD", &["RSD", "din."], Some(','), Some('.')),
    RuleSpec::latin("EUR", &["€", "EUR"], Some(','), Some('.')),
    RuleSpec::latin("RUB", &["₽", "RUB", "руб."], Some(','), Some(' ')),
    RuleSpec::latin("UAH", &["₴", "UAH", "грн"], Some(','), Some(' ')),
    RuleSpec::latin("KZT", &["₸", "KZT"], Some(','), Some(' ')),
    RuleSpec::latin("GEL", &["₾", "GEL"], Some(','), Some(' ')),
    RuleSpec::native("IQD", &["IQD", "د.ع."], DigitSystem::ArabicIndic, ARABIC_DECIMAL),
    RuleSpec::native("EGP", &["EGP", "E£", "ج.م."], DigitSystem::ArabicIndic, ARABIC_DECIMAL),
    RuleSpec::native("SAR", &["SAR", "ر.س."], DigitSystem::ArabicIndic, ARABIC_DECIMAL),
    RuleSpec::native("AED", &["AED", "د.إ."], DigitSystem::ArabicIndic, ARABIC_DECIMAL),
    RuleSpec::native("QAR", &["QAR", "ر.ق."], DigitSystem::ArabicIndic, ARABIC_DECIMAL),
    RuleSpec::native("BDT", &["BDT", "৳"], DigitSystem::Bengali, '.'),
    RuleSpec::native("MMK", &["MMK", "K"], DigitSystem::Myanmar, '.'),
    RuleSpec::native("KHR", &["KHR", "៛"], DigitSystem::Khmer, '.'),
    RuleSpec {
        currency: "PAB",
        strip: &["B/.", "PAB", "US$", "$"],
        digits: None,
        decimal: None,
        thousands: Some(','),
        preconverted: true,
    },
];

/// Immutable lookup from currency code to format rule.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    rules: HashMap<String, CurrencyFormatRule>,
    fallback: CurrencyFormatRule,
}

impl FormatRegistry {
    /// Registry with only the built-in rules.
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES.iter().map(|spec| (spec.currency.to_string(), spec.to_rule())).collect();
        Self { rules, fallback: CurrencyFormatRule::fallback() }
    }

    /// Built-in rules with `overrides` replacing or adding entries.
    pub fn with_overrides(overrides: &BTreeMap<String, CurrencyFormatRule>) -> Self {
        let mut registry = Self::builtin();
        for (code, rule) in overrides {
            registry.rules.insert(code.to_uppercase(), rule.clone());
        }
        registry
    }

    /// Returns the rule registered for `currency_code`, or the fallback rule.
    pub fn rule_for(&self, currency_code: &str) -> &CurrencyFormatRule {
        self.rules.get(&currency_code.to_uppercase()).unwrap_or(&self.fallback)
    }

    /// Returns true if a dedicated rule exists for `currency_code`.
    pub fn has_rule(&self, currency_code: &str) -> bool {
        self.rules.contains_key(&currency_code.to_uppercase())
    }

    pub fn fallback(&self) -> &CurrencyFormatRule {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
