//! Price text parsing command, for checking format rules against real strings.

use crate::config::Config;
use crate::pricing::{Denomination, PriceTextParser};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Parses a single price text with the configured rules and rates.
pub struct ParseCommand {
    parser: PriceTextParser,
}

impl ParseCommand {
    /// Creates a new parse command.
    pub fn new(config: &Config) -> Self {
        let parser =
            PriceTextParser::new(Arc::new(config.format_registry()), Arc::new(config.rate_table()));
        Self { parser }
    }

    /// Parses `text` as a `currency` price and describes each step.
    pub fn execute(&self, text: &str, currency: &str) -> Result<String> {
        let currency = currency.trim().to_uppercase();

        let amounts = self
            .parser
            .parse_amounts(text, &currency)
            .with_context(|| format!("Failed to parse '{}' as {}", text, currency))?;
        let (min_usd, max_usd) = self
            .parser
            .try_parse_quote(text, &currency)
            .with_context(|| format!("Failed to parse '{}' as {}", text, currency))?;

        let denomination = match &amounts.denomination {
            Denomination::Usd => "USD (marked in text)".to_string(),
            Denomination::Local(code) => match self.parser.rates().rate(code) {
                Some(rate) => format!("{} at {} per USD", code, rate),
                None => format!("{} (no rate, read as USD)", code),
            },
        };

        let lines = [
            format!("Input:    {}", text),
            format!("Currency: {}", denomination),
            format!("Amounts:  {} - {}", amounts.min, amounts.max),
            format!("USD:      {} - {}", min_usd, max_usd),
        ];

        Ok(lines.join("\n"))
    }
}
