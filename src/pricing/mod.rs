//! Price normalization: format rules, text parsing and USD conversion.

pub mod formats;
pub mod parser;
pub mod rates;

pub use formats::{CurrencyFormatRule, DigitSystem, FormatRegistry};
pub use parser::{Denomination, LocalAmounts, PriceTextParser, PRICE_FLOOR};
pub use rates::{round_cents, RateTable};
