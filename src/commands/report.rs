//! Multi-region price report command.

use crate::config::Config;
use crate::error::ReportError;
use crate::format::Formatter;
use crate::pricing::{FormatRegistry, PriceTextParser, RateTable};
use crate::report::{BatchOrchestrator, Report, ReportAggregator};
use crate::storefront::{AppIdentifier, HttpStorefront, RegionFetcher, StorefrontClient};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Builds a price report for one app across the configured regions.
pub struct ReportCommand {
    config: Config,
    formats: Arc<FormatRegistry>,
    rates: Arc<RateTable>,
}

impl ReportCommand {
    /// Creates a new report command. Format rules and rates are merged once here.
    pub fn new(config: Config) -> Self {
        let formats = Arc::new(config.format_registry());
        let rates = Arc::new(config.rate_table());
        Self { config, formats, rates }
    }

    /// Fetches every region and returns the sorted report.
    ///
    /// The identifier is validated before any request is made. Region
    /// failures never fail the call; they are listed in `Report::excluded`.
    pub async fn get_report(&self, input: &str) -> Result<Report, ReportError> {
        let app_id = AppIdentifier::parse(input, self.config.source)?;
        self.config.validate()?;

        let client =
            HttpStorefront::new(&self.config).map_err(|e| ReportError::Client(format!("{:#}", e)))?;

        self.run(Arc::new(client), app_id).await
    }

    /// Same as [`get_report`](Self::get_report) with a provided client (for testing).
    pub async fn get_report_with_client(
        &self,
        client: Arc<dyn StorefrontClient>,
        input: &str,
    ) -> Result<Report, ReportError> {
        let app_id = AppIdentifier::parse(input, client.source())?;
        self.config.validate()?;

        self.run(client, app_id).await
    }

    /// Builds the report and returns formatted output.
    pub async fn execute(&self, input: &str) -> Result<String> {
        let report = self.get_report(input).await?;
        Ok(Formatter::new(self.config.format).format_report(&report))
    }

    /// Builds the report with a provided client and returns formatted output.
    pub async fn execute_with_client(
        &self,
        client: Arc<dyn StorefrontClient>,
        input: &str,
    ) -> Result<String> {
        let report = self.get_report_with_client(client, input).await?;
        Ok(Formatter::new(self.config.format).format_report(&report))
    }

    async fn run(&self, client: Arc<dyn StorefrontClient>, app_id: AppIdentifier) -> Result<Report, ReportError> {
        let regions = self.config.region_targets()?;
        info!("Pricing {} ({}) across {} regions", app_id, app_id.source(), regions.len());

        let fetcher = RegionFetcher::new(client, self.config.timeout());
        let orchestrator = BatchOrchestrator::new(fetcher, self.config.batch_size)
            .with_pause(self.config.batch_pause_ms, self.config.batch_pause_jitter_ms);
        let outcomes = orchestrator.run(&regions, &app_id).await;

        let parser = PriceTextParser::new(self.formats.clone(), self.rates.clone());
        let aggregator = ReportAggregator::new(parser)
            .with_selection(self.config.offer_selection)
            .with_reference_currency(self.config.reference_currency.as_deref());

        Ok(aggregator.aggregate(&outcomes))
    }
}
