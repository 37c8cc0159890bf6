//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::error::ReportError;
use crate::pricing::{CurrencyFormatRule, FormatRegistry, RateTable};
use crate::report::aggregate::OfferSelection;
use crate::report::orchestrator::DEFAULT_BATCH_SIZE;
use crate::storefront::regions::{self, RegionTarget};
use crate::storefront::StoreSource;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storefront family to query
    #[serde(default)]
    pub source: StoreSource,

    /// Region codes to scan, in order (empty = built-in list)
    #[serde(default)]
    pub regions: Vec<String>,

    /// Number of regions fetched concurrently
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between batches in milliseconds
    #[serde(default)]
    pub batch_pause_ms: u64,

    /// Random jitter added to the pause (0 to this value)
    #[serde(default)]
    pub batch_pause_jitter_ms: u64,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Which offers of a region make up its quote
    #[serde(default)]
    pub offer_selection: OfferSelection,

    /// Extra currency column for the max price (e.g. "RUB")
    #[serde(default)]
    pub reference_currency: Option<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Exchange rates (units per USD) merged onto the built-in table
    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,

    /// Per-currency format rules merged onto the built-in registry
    #[serde(default)]
    pub currency_formats: BTreeMap<String, CurrencyFormatRule>,

    /// Offer API URL template with `{region}` and `{app_id}` placeholders
    #[serde(default = "default_app_store_api_url")]
    pub app_store_api_url: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_app_store_api_url() -> String {
    "https://apps.apple.com/{region}/app/id{app_id}/offers.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: StoreSource::GooglePlay,
            regions: Vec::new(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            batch_pause_ms: 0,
            batch_pause_jitter_ms: 0,
            proxy: None,
            offer_selection: OfferSelection::First,
            reference_currency: None,
            format: OutputFormat::Table,
            rates: BTreeMap::new(),
            currency_formats: BTreeMap::new(),
            app_store_api_url: default_app_store_api_url(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("iap-scout.toml");
        if local_config.exists() {
            debug!("Found iap-scout.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("iap-scout").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(source) = std::env::var("IAP_SCOUT_SOURCE") {
            if let Ok(s) = source.parse() {
                self.source = s;
            }
        }

        if let Ok(proxy) = std::env::var("IAP_SCOUT_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(size) = std::env::var("IAP_SCOUT_BATCH_SIZE") {
            if let Ok(n) = size.parse() {
                self.batch_size = n;
            }
        }

        if let Ok(timeout) = std::env::var("IAP_SCOUT_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }

        self
    }

    /// Checks settings that would otherwise fail halfway through a run.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.batch_size == 0 {
            return Err(ReportError::Config("batch_size must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ReportError::Config("timeout_secs must be at least 1".to_string()));
        }
        if let Some((code, rate)) = self.rates.iter().find(|(_, rate)| rate.is_sign_negative()) {
            return Err(ReportError::Config(format!("rate for {} is negative: {}", code, rate)));
        }
        self.region_targets()?;
        Ok(())
    }

    /// Regions to scan: the configured list, or the built-in one.
    pub fn region_targets(&self) -> Result<Vec<RegionTarget>, ReportError> {
        if self.regions.is_empty() {
            return Ok(regions::default_targets());
        }
        regions::parse_region_list(&self.regions).map_err(|e| ReportError::Config(e.to_string()))
    }

    /// Built-in format rules with the configured overrides applied.
    pub fn format_registry(&self) -> FormatRegistry {
        FormatRegistry::with_overrides(&self.currency_formats)
    }

    /// Built-in rates with the configured overrides applied.
    pub fn rate_table(&self) -> RateTable {
        RateTable::builtin().with_overrides(&self.rates)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
