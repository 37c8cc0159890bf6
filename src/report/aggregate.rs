//! Turns fetch outcomes into a sorted USD price report.

use crate::error::ParseError;
use crate::pricing::PriceTextParser;
use crate::report::orchestrator::BatchOutcomes;
use crate::storefront::fetcher::{RawFetchOutcome, RawOffer};
use crate::storefront::regions::RegionTarget;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Which offers of a region make up its quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSelection {
    /// Only the first offer the storefront lists.
    #[default]
    First,
    /// Lowest and highest bound over every offer.
    Span,
}

impl fmt::Display for OfferSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferSelection::First => write!(f, "first"),
            OfferSelection::Span => write!(f, "span"),
        }
    }
}

impl FromStr for OfferSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(OfferSelection::First),
            "span" | "all" => Ok(OfferSelection::Span),
            _ => Err(format!("Unknown offer selection: {}. Use: first, span", s)),
        }
    }
}

/// USD price range for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub region_code: String,
    pub currency_code: String,
    pub raw_text: String,
    pub min_usd: Decimal,
    pub max_usd: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_duration: Option<String>,
    /// `max_usd` expressed in the report's reference currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_reference: Option<Decimal>,
}

/// Why a region has no quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExclusionReason {
    NoOffer,
    NotFound,
    Timeout,
    TransportError(String),
    ParseFailure(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::NoOffer => write!(f, "no in-app offers"),
            ExclusionReason::NotFound => write!(f, "not found"),
            ExclusionReason::Timeout => write!(f, "timed out"),
            ExclusionReason::TransportError(msg) => write!(f, "transport error: {}", msg),
            ExclusionReason::ParseFailure(msg) => write!(f, "unreadable price: {}", msg),
        }
    }
}

/// A region left out of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedRegion {
    pub region_code: String,
    pub currency_code: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Price quotes sorted ascending by `min_usd`, plus the regions left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_currency: Option<String>,
    pub quotes: Vec<PriceQuote>,
    pub excluded: Vec<ExcludedRegion>,
}

impl Report {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_title: None,
            reference_currency: None,
            quotes: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Returns the cheapest region.
    pub fn cheapest(&self) -> Option<&PriceQuote> {
        self.quotes.first()
    }

    /// Returns the region with the highest starting price.
    pub fn most_expensive(&self) -> Option<&PriceQuote> {
        self.quotes.last()
    }

    /// Difference between the highest and lowest starting price.
    pub fn max_savings(&self) -> Option<Decimal> {
        match (self.cheapest(), self.most_expensive()) {
            (Some(cheap), Some(expensive)) => Some(expensive.min_usd - cheap.min_usd),
            _ => None,
        }
    }

    /// Savings as a percentage of the highest starting price.
    pub fn max_savings_percent(&self) -> Option<Decimal> {
        match (self.cheapest(), self.most_expensive()) {
            (Some(cheap), Some(expensive)) if !expensive.min_usd.is_zero() => Some(
                ((expensive.min_usd - cheap.min_usd) / expensive.min_usd * Decimal::ONE_HUNDRED)
                    .round_dp(1),
            ),
            _ => None,
        }
    }
}

/// Builds a [`Report`] from the outcomes of a run.
pub struct ReportAggregator {
    parser: PriceTextParser,
    selection: OfferSelection,
    reference_currency: Option<String>,
}

impl ReportAggregator {
    pub fn new(parser: PriceTextParser) -> Self {
        Self { parser, selection: OfferSelection::First, reference_currency: None }
    }

    pub fn with_selection(mut self, selection: OfferSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Adds a `max_reference` column priced in `currency_code`.
    ///
    /// Ignored, with a warning, when the rate table has no rate for it.
    pub fn with_reference_currency(mut self, currency_code: Option<&str>) -> Self {
        self.reference_currency = currency_code.and_then(|code| {
            let code = code.trim().to_uppercase();
            if self.parser.rates().rate(&code).is_some() {
                Some(code)
            } else {
                warn!("No exchange rate for reference currency {}, column skipped", code);
                None
            }
        });
        self
    }

    /// Builds the report. Pure: the same outcomes always give the same report.
    pub fn aggregate(&self, outcomes: &BatchOutcomes) -> Report {
        let mut report = Report::new(outcomes.app_id.clone());
        report.reference_currency = self.reference_currency.clone();

        for entry in outcomes.iter() {
            let region = &entry.region;
            let reason = match &entry.outcome {
                RawFetchOutcome::Success { offers, app_title } => {
                    if report.app_title.is_none() {
                        report.app_title = app_title.clone();
                    }
                    match self.quote(region, offers) {
                        Ok(quote) => {
                            report.quotes.push(quote);
                            continue;
                        }
                        Err(e) => {
                            warn!("{}: excluded, {}", region, e);
                            ExclusionReason::ParseFailure(e.to_string())
                        }
                    }
                }
                RawFetchOutcome::NoOffer => ExclusionReason::NoOffer,
                RawFetchOutcome::NotFound => ExclusionReason::NotFound,
                RawFetchOutcome::Timeout => ExclusionReason::Timeout,
                RawFetchOutcome::TransportError { message } => {
                    ExclusionReason::TransportError(message.clone())
                }
            };

            debug!("{}: excluded ({})", region, reason);
            report.excluded.push(ExcludedRegion {
                region_code: region.region_code.clone(),
                currency_code: region.currency_code.clone(),
                reason,
            });
        }

        report.quotes.sort_by(|a, b| a.min_usd.cmp(&b.min_usd));

        info!(
            "Report for {}: {} regions priced, {} excluded",
            report.app_id,
            report.quotes.len(),
            report.excluded.len()
        );

        report
    }

    fn quote(&self, region: &RegionTarget, offers: &[RawOffer]) -> Result<PriceQuote, ParseError> {
        let first = offers.first().ok_or_else(|| ParseError::NoDigits(String::new()))?;

        let mut quote = match self.selection {
            OfferSelection::First => self.quote_offer(region, first)?,
            OfferSelection::Span => self.quote_span(region, offers)?,
        };

        quote.max_reference = self
            .reference_currency
            .as_deref()
            .and_then(|code| self.parser.rates().from_usd(quote.max_usd, code));

        Ok(quote)
    }

    fn quote_offer(&self, region: &RegionTarget, offer: &RawOffer) -> Result<PriceQuote, ParseError> {
        let (min_usd, max_usd) = self.parser.try_parse_quote(&offer.price_text, &region.currency_code)?;

        Ok(PriceQuote {
            region_code: region.region_code.clone(),
            currency_code: region.currency_code.clone(),
            raw_text: offer.price_text.clone(),
            min_usd,
            max_usd,
            offer_name: offer.name.clone(),
            offer_duration: offer.duration.clone(),
            max_reference: None,
        })
    }

    /// One quote spanning every readable offer; unreadable ones are skipped.
    fn quote_span(&self, region: &RegionTarget, offers: &[RawOffer]) -> Result<PriceQuote, ParseError> {
        let mut span: Option<PriceQuote> = None;
        let mut first_error = None;

        for offer in offers {
            let quote = match self.quote_offer(region, offer) {
                Ok(quote) => quote,
                Err(e) => {
                    warn!("{}: skipping offer '{}': {}", region, offer.price_text, e);
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            span = Some(match span {
                None => PriceQuote { offer_name: None, offer_duration: None, ..quote },
                Some(mut acc) => {
                    acc.min_usd = acc.min_usd.min(quote.min_usd);
                    acc.max_usd = acc.max_usd.max(quote.max_usd);
                    acc.raw_text = format!("{}; {}", acc.raw_text, quote.raw_text);
                    acc
                }
            });
        }

        match (span, first_error) {
            (Some(quote), _) => Ok(quote),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ParseError::NoDigits(String::new())),
        }
    }
}
