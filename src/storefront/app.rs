//! Storefront kinds and app identifiers.

use crate::error::ReportError;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)+$").unwrap());

static PLAY_URL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_.]+)").unwrap());

static APP_STORE_URL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/id([0-9]+)").unwrap());

/// Which storefront family to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreSource {
    /// Google Play listing pages (HTML markup).
    #[default]
    GooglePlay,
    /// App Store offer API (JSON).
    AppStore,
}

impl fmt::Display for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSource::GooglePlay => write!(f, "google-play"),
            StoreSource::AppStore => write!(f, "app-store"),
        }
    }
}

impl FromStr for StoreSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google-play" | "google" | "play" | "gp" => Ok(StoreSource::GooglePlay),
            "app-store" | "appstore" | "apple" | "ios" => Ok(StoreSource::AppStore),
            _ => Err(format!("Unknown source: {}. Use: google-play, app-store", s)),
        }
    }
}

/// A validated application identifier for one storefront family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AppIdentifier {
    id: String,
    source: StoreSource,
}

impl AppIdentifier {
    /// Accepts a bare identifier or a storefront link.
    ///
    /// Google Play takes a package name (`com.example.app`) or a
    /// `...details?id=` link; the App Store takes a numeric id, `id123`, or an
    /// `apps.apple.com/.../id123` link.
    pub fn parse(input: &str, source: StoreSource) -> Result<Self, ReportError> {
        let input = input.trim();
        let invalid = || ReportError::InvalidAppIdentifier(input.to_string());

        let id = match source {
            StoreSource::GooglePlay => {
                let candidate = PLAY_URL_ID
                    .captures(input)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str())
                    .unwrap_or(input);
                PACKAGE_NAME.is_match(candidate).then(|| candidate.to_string()).ok_or_else(invalid)?
            }
            StoreSource::AppStore => {
                let candidate = APP_STORE_URL_ID
                    .captures(input)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str())
                    .unwrap_or_else(|| input.trim_start_matches("id"));
                let valid = !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit());
                valid.then(|| candidate.to_string()).ok_or_else(invalid)?
            }
        };

        Ok(Self { id, source })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> StoreSource {
        self.source
    }
}

impl fmt::Display for AppIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
