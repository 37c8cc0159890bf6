//! Storefront regions and their currencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Region → storefront currency. Regions not listed are priced in USD.
const REGION_CURRENCIES: &[(&str, &str)] = &[
    ("AE", "AED"),
    ("AU", "AUD"),
    ("BD", "BDT"),
    ("BH", "BHD"),
    ("BO", "BOB"),
    ("BR", "BRL"),
    ("CA", "CAD"),
    ("CL", "CLP"),
    ("CO", "COP"),
    ("CR", "CRC"),
    ("DZ", "DZD"),
    ("EG", "EGP"),
    ("GE", "GEL"),
    ("GH", "GHS"),
    ("HK", "HKD"),
    ("ID", "IDR"),
    ("IL", "ILS"),
    ("IN", "INR"),
    ("IQ", "IQD"),
    ("JO", "JOD"),
    ("JP", "JPY"),
    ("KE", "KES"),
    ("KH", "KHR"),
    ("KR", "KRW"),
    ("KW", "KWD"),
    ("KY", "KYD"),
    ("KZ", "KZT"),
    ("LK", "LKR"),
    ("MA", "MAD"),
    ("MM", "MMK"),
    ("MO", "MOP"),
    ("MX", "MXN"),
    ("MY", "MYR"),
    ("NG", "NGN"),
    ("NZ", "NZD"),
    ("OM", "OMR"),
    ("PA", "PAB"),
    ("PE", "PEN"),
    ("PH", "PHP"),
    ("PK", "PKR"),
    ("PY", "PYG"),
    ("QA", "QAR"),
    ("RS", "RSD"),
    ("RU", "RUB"),
    ("SA", "SAR"),
    ("SG", "SGD"),
    ("TH", "THB"),
    ("TR", "TRY"),
    ("TW", "TWD"),
    ("TZ", "TZS"),
    ("UA", "UAH"),
    ("US", "USD"),
    ("VN", "VND"),
    ("ZA", "ZAR"),
];

/// Regions scanned when the configuration does not list any.
pub const DEFAULT_REGIONS: &[&str] = &[
    "DZ", "EG", "AU", "BD", "BO", "BR", "CA", "CL", "CO", "CR", "GE", "GH", "HK", "IN", "ID", "IQ",
    "IL", "JP", "JO", "KZ", "KE", "KR", "MO", "MY", "MX", "MA", "MM", "NZ", "NG", "PK", "PY", "PE",
    "PH", "QA", "RU", "SA", "RS", "SG", "ZA", "LK", "TW", "TZ", "TH", "TR", "UA", "AE", "US", "VN",
];

/// Currency used by the storefront of `region_code`, "USD" if unknown.
pub fn currency_for(region_code: &str) -> &'static str {
    let code = region_code.to_uppercase();
    REGION_CURRENCIES
        .iter()
        .find(|(region, _)| *region == code)
        .map(|(_, currency)| *currency)
        .unwrap_or("USD")
}

/// One storefront to query: a country code and the currency it prices in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionTarget {
    pub region_code: String,
    pub currency_code: String,
}

impl RegionTarget {
    /// Target for `region_code` with its currency looked up.
    pub fn new(region_code: &str) -> Self {
        let region_code = region_code.trim().to_uppercase();
        let currency_code = currency_for(&region_code).to_string();
        Self { region_code, currency_code }
    }

    /// Target with an explicit currency.
    pub fn with_currency(region_code: &str, currency_code: &str) -> Self {
        Self {
            region_code: region_code.trim().to_uppercase(),
            currency_code: currency_code.trim().to_uppercase(),
        }
    }

    /// Flag emoji built from the regional indicator symbols.
    pub fn flag(&self) -> String {
        if !is_valid_region_code(&self.region_code) {
            return "🏳️".to_string();
        }
        self.region_code
            .chars()
            .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
            .collect()
    }
}

impl fmt::Display for RegionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.region_code, self.currency_code)
    }
}

fn is_valid_region_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase())
}

/// Built-in scan list in its fixed order.
pub fn default_targets() -> Vec<RegionTarget> {
    DEFAULT_REGIONS.iter().map(|code| RegionTarget::new(code)).collect()
}

/// Resolves a configured list of region codes.
///
/// Duplicates are dropped, keeping the first occurrence, so every region is
/// fetched at most once per run.
pub fn parse_region_list<S: AsRef<str>>(codes: &[S]) -> Result<Vec<RegionTarget>, RegionParseError> {
    let mut targets: Vec<RegionTarget> = Vec::with_capacity(codes.len());

    for code in codes {
        let target = RegionTarget::new(code.as_ref());
        if !is_valid_region_code(&target.region_code) {
            return Err(RegionParseError(code.as_ref().to_string()));
        }
        if !targets.iter().any(|t| t.region_code == target.region_code) {
            targets.push(target);
        }
    }

    Ok(targets)
}

#[derive(Debug, Clone)]
pub struct RegionParseError(String);

impl fmt::Display for RegionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid region code '{}'. Expected a two-letter country code such as US or JP", self.0)
    }
}

impl std::error::Error for RegionParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_lookup() {
        assert_eq!(currency_for("JP"), "JPY");
        assert_eq!(currency_for("id"), "IDR");
        assert_eq!(currency_for("JO"), "JOD");
        assert_eq!(currency_for("US"), "USD");
        // Unmapped regions fall back to USD
        assert_eq!(currency_for("FR"), "USD");
        assert_eq!(currency_for(""), "USD");
    }

    #[test]
    fn test_region_target_new() {
        let target = RegionTarget::new(" jp ");
        assert_eq!(target.region_code, "JP");
        assert_eq!(target.currency_code, "JPY");
        assert_eq!(target.to_string(), "JP (JPY)");
    }

    #[test]
    fn test_region_target_with_currency() {
        let target = RegionTarget::with_currency("de", "eur");
        assert_eq!(target.region_code, "DE");
        assert_eq!(target.currency_code, "EUR");
    }

    #[test]
    fn test_flag() {
        assert_eq!(RegionTarget::new("JP").flag(), "🇯🇵");
        assert_eq!(RegionTarget::new("US").flag(), "🇺🇸");
        assert_eq!(RegionTarget::new("X1").flag(), "🏳️");
    }

    #[test]
    fn test_default_targets() {
        let targets = default_targets();
        assert_eq!(targets.len(), 48);
        assert_eq!(targets[0].region_code, "DZ");
        assert_eq!(targets[0].currency_code, "DZD");
        assert_eq!(targets.last().unwrap().region_code, "VN");
        // Every default region has a dedicated currency entry
        for target in &targets {
            assert!(REGION_CURRENCIES.iter().any(|(r, _)| *r == target.region_code));
        }
    }

    #[test]
    fn test_parse_region_list() {
        let targets = parse_region_list(&["jp", "US", "JP", "fr"]).unwrap();
        let codes: Vec<_> = targets.iter().map(|t| t.region_code.as_str()).collect();
        assert_eq!(codes, vec!["JP", "US", "FR"]);
        assert_eq!(targets[2].currency_code, "USD");
    }

    #[test]
    fn test_parse_region_list_invalid() {
        let err = parse_region_list(&["JP", "USA"]).unwrap_err();
        assert!(err.to_string().contains("USA"));
        assert!(parse_region_list(&["1A"]).is_err());
        assert!(parse_region_list::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_region_target_serde() {
        let target = RegionTarget::new("KR");
        let json = serde_json::to_string(&target).unwrap();
        assert!(json.contains("\"region_code\":\"KR\""));
        assert!(json.contains("\"currency_code\":\"KRW\""));
    }
}
