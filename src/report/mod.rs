//! Run orchestration and report building.

pub mod aggregate;
pub mod orchestrator;

pub use aggregate::{ExcludedRegion, ExclusionReason, OfferSelection, PriceQuote, Report, ReportAggregator};
pub use orchestrator::{BatchOrchestrator, BatchOutcomes, RegionOutcome, DEFAULT_BATCH_SIZE};
