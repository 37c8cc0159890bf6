//! Storefront access: regions, app identifiers, HTTP transport and
//! per-region fetch classification.

pub mod app;
pub mod client;
pub mod extract;
pub mod fetcher;
pub mod regions;

pub use app::{AppIdentifier, StoreSource};
pub use client::{HttpStorefront, JsonResponse, PageResponse, StorefrontClient};
pub use fetcher::{RawFetchOutcome, RawOffer, RegionFetcher};
pub use regions::{RegionParseError, RegionTarget};
