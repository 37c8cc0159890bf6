//! iap-scout - Compare in-app purchase prices across national storefronts
//!
//! Fetches an app's listing from many regional storefronts in small
//! concurrent batches, reads the localized "per item" price text, and
//! normalizes every region to a USD range sorted from cheapest up.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod pricing;
pub mod report;
pub mod storefront;

pub use commands::ReportCommand;
pub use config::{Config, OutputFormat};
pub use error::{ParseError, ReportError, TransportError};
pub use pricing::{CurrencyFormatRule, FormatRegistry, PriceTextParser, RateTable};
pub use report::{ExclusionReason, OfferSelection, PriceQuote, Report};
pub use storefront::{AppIdentifier, RawFetchOutcome, RegionTarget, StoreSource};
