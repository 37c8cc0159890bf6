//! HTTP client for storefront requests using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::TransportError;
use crate::storefront::app::{AppIdentifier, StoreSource};
use crate::storefront::regions::RegionTarget;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

const GOOGLE_PLAY_BASE: &str = "https://play.google.com";

/// Status and body of a markup page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// Status and decoded body of an API call; `body` is `None` if it was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// Storefront access - enables mocking for tests.
#[async_trait]
pub trait StorefrontClient: Send + Sync {
    /// Storefront family this client talks to.
    fn source(&self) -> StoreSource;

    /// Builds the listing URL for an app in one region.
    fn listing_url(&self, app_id: &AppIdentifier, region: &RegionTarget) -> String;

    /// GETs a markup page.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageResponse, TransportError>;

    /// GETs a JSON document.
    async fn fetch_json(&self, url: &str, timeout: Duration) -> Result<JsonResponse, TransportError>;
}

/// Storefront client with browser impersonation.
pub struct HttpStorefront {
    client: Client,
    source: StoreSource,
    base_url: Option<String>,
    api_url_template: String,
}

impl HttpStorefront {
    /// Creates a new client from the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Creates a new client with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            source: config.source,
            base_url,
            api_url_template: config.app_store_api_url.clone(),
        })
    }

    fn play_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(GOOGLE_PLAY_BASE)
    }

    /// Performs a GET bounded by `timeout` and returns status and body text.
    async fn get(&self, url: &str, accept: &str, timeout: Duration) -> Result<PageResponse, TransportError> {
        debug!("GET {}", url);

        let request = async {
            let response = self
                .client
                .get(url)
                .emulation(Emulation::Chrome131)
                .header("Accept", accept)
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("Cache-Control", "no-cache")
                .header("Pragma", "no-cache")
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            let status = response.status().as_u16();
            debug!("Response status: {}", status);

            if status == 429 || status == 503 {
                warn!("Storefront throttled the request ({}) for {}", status, url);
            }

            let body = response.text().await.map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(PageResponse { status, body })
        };

        tokio::time::timeout(timeout, request).await.map_err(|_| TransportError::Timeout)?
    }
}

fn transport_error(e: &wreq::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(e.to_string())
    }
}

/// Fills `{region}` (lowercase) and `{app_id}` into an API URL template.
pub fn expand_template(template: &str, app_id: &AppIdentifier, region: &RegionTarget) -> String {
    template
        .replace("{region}", &region.region_code.to_lowercase())
        .replace("{app_id}", &urlencoding::encode(app_id.as_str()))
}

#[async_trait]
impl StorefrontClient for HttpStorefront {
    fn source(&self) -> StoreSource {
        self.source
    }

    fn listing_url(&self, app_id: &AppIdentifier, region: &RegionTarget) -> String {
        match self.source {
            StoreSource::GooglePlay => format!(
                "{}/store/apps/details?id={}&hl=en&gl={}",
                self.play_base_url(),
                urlencoding::encode(app_id.as_str()),
                region.region_code
            ),
            StoreSource::AppStore => expand_template(&self.api_url_template, app_id, region),
        }
    }

    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageResponse, TransportError> {
        self.get(
            url,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            timeout,
        )
        .await
    }

    async fn fetch_json(&self, url: &str, timeout: Duration) -> Result<JsonResponse, TransportError> {
        let page = self.get(url, "application/json", timeout).await?;
        let body = serde_json::from_str(&page.body).ok();
        Ok(JsonResponse { status: page.status, body })
    }
}
