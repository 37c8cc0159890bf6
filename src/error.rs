//! Error types shared across the pricing, storefront and report layers.

use thiserror::Error;

/// Failure to turn a localized price token into a number.
///
/// Never escapes a run: the parser logs it and the aggregator moves the
/// region into the excluded list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no digits found in price text '{0}'")]
    NoDigits(String),

    #[error("could not read '{cleaned}' (from '{raw}') as a number")]
    InvalidNumber { raw: String, cleaned: String },

    #[error("malformed price range '{0}'")]
    InvalidRange(String),

    #[error("price '{amount}' cannot be converted from {currency}")]
    OutOfRange { amount: String, currency: String },
}

/// Transport-level failure reported by a storefront client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Http(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Failure surfaced by the public `get_report` entry point.
///
/// Per-region problems are not errors; they end up in the report's
/// excluded list instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("'{0}' is not a valid app identifier or storefront link")]
    InvalidAppIdentifier(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to create storefront client: {0}")]
    Client(String),
}
