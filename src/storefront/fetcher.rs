//! Per-region fetch and classification.

use crate::error::TransportError;
use crate::storefront::app::{AppIdentifier, StoreSource};
use crate::storefront::client::StorefrontClient;
use crate::storefront::extract::{self, ApiListing};
use crate::storefront::regions::RegionTarget;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One purchasable item as the storefront shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawOffer {
    pub price_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl RawOffer {
    /// Offer known only by its price text.
    pub fn from_text(price_text: impl Into<String>) -> Self {
        Self { price_text: price_text.into(), name: None, duration: None }
    }
}

/// What a single region's fetch produced. Created once per region per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RawFetchOutcome {
    /// At least one offer, in storefront order.
    Success {
        offers: Vec<RawOffer>,
        #[serde(skip_serializing_if = "Option::is_none")]
        app_title: Option<String>,
    },
    /// Listing exists but sells nothing.
    NoOffer,
    /// Listing does not exist in this region.
    NotFound,
    Timeout,
    TransportError { message: String },
}

impl RawFetchOutcome {
    /// Success with bare price texts.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        RawFetchOutcome::Success {
            offers: tokens.iter().map(|t| RawOffer::from_text(t.as_ref())).collect(),
            app_title: None,
        }
    }

    /// Price texts of a success, empty otherwise.
    pub fn price_tokens(&self) -> Vec<&str> {
        match self {
            RawFetchOutcome::Success { offers, .. } => {
                offers.iter().map(|o| o.price_text.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RawFetchOutcome::Success { .. })
    }

    fn from_transport(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => RawFetchOutcome::Timeout,
            other => RawFetchOutcome::TransportError { message: other.to_string() },
        }
    }

    fn from_offers(offers: Vec<RawOffer>, app_title: Option<String>) -> Self {
        if offers.is_empty() {
            RawFetchOutcome::NoOffer
        } else {
            RawFetchOutcome::Success { offers, app_title }
        }
    }
}

/// Fetches one region's listing and classifies the response.
#[derive(Clone)]
pub struct RegionFetcher {
    client: Arc<dyn StorefrontClient>,
    timeout: Duration,
}

impl RegionFetcher {
    pub fn new(client: Arc<dyn StorefrontClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the fetch for `region`. Never fails; every problem becomes an outcome.
    ///
    /// The timeout is enforced here as well as handed to the client, so a
    /// client that ignores it still cannot hold up the batch.
    pub async fn fetch(&self, region: &RegionTarget, app_id: &AppIdentifier) -> RawFetchOutcome {
        let url = self.client.listing_url(app_id, region);
        debug!("Fetching {} for {}", region, url);

        let outcome = match self.client.source() {
            StoreSource::GooglePlay => self.fetch_markup(&url).await,
            StoreSource::AppStore => self.fetch_api(&url).await,
        };

        match &outcome {
            RawFetchOutcome::Success { offers, .. } => {
                info!("{}: {} offer(s)", region, offers.len());
            }
            RawFetchOutcome::TransportError { message } => {
                warn!("{}: transport error: {}", region, message);
            }
            RawFetchOutcome::Timeout => warn!("{}: timed out after {:?}", region, self.timeout),
            other => debug!("{}: {:?}", region, other),
        }

        outcome
    }

    async fn fetch_markup(&self, url: &str) -> RawFetchOutcome {
        let page = match timeout(self.timeout, self.client.fetch_page(url, self.timeout)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => return RawFetchOutcome::from_transport(e),
            Err(_) => return RawFetchOutcome::Timeout,
        };

        if page.status == 404 || extract::is_not_found_page(&page.body) {
            return RawFetchOutcome::NotFound;
        }
        if !(200..300).contains(&page.status) {
            return RawFetchOutcome::TransportError { message: status_message(page.status) };
        }
        if !extract::has_offer_marker(&page.body) {
            return RawFetchOutcome::NoOffer;
        }

        let offers: Vec<RawOffer> =
            extract::price_tokens(&page.body).into_iter().map(RawOffer::from_text).collect();
        let app_title = if offers.is_empty() { None } else { extract::app_title(&page.body) };

        RawFetchOutcome::from_offers(offers, app_title)
    }

    async fn fetch_api(&self, url: &str) -> RawFetchOutcome {
        let response = match timeout(self.timeout, self.client.fetch_json(url, self.timeout)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return RawFetchOutcome::from_transport(e),
            Err(_) => return RawFetchOutcome::Timeout,
        };

        if response.status == 404 {
            return RawFetchOutcome::NotFound;
        }
        if !(200..300).contains(&response.status) {
            return RawFetchOutcome::TransportError { message: status_message(response.status) };
        }

        let Some(doc) = response.body else {
            return RawFetchOutcome::TransportError {
                message: "malformed JSON response".to_string(),
            };
        };

        match extract::api_listing(&doc) {
            ApiListing::NotFound => RawFetchOutcome::NotFound,
            ApiListing::Offers { offers, app_title } => RawFetchOutcome::from_offers(offers, app_title),
        }
    }
}

fn status_message(status: u16) -> String {
    match status {
        429 | 503 => format!("HTTP status {} (rate limited)", status),
        _ => format!("HTTP status {}", status),
    }
}
