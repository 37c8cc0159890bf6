//! Bounded-concurrency fan-out of region fetches.

use crate::storefront::app::AppIdentifier;
use crate::storefront::fetcher::{RawFetchOutcome, RegionFetcher};
use crate::storefront::regions::RegionTarget;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Regions fetched concurrently when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// The outcome recorded for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOutcome {
    pub region: RegionTarget,
    pub outcome: RawFetchOutcome,
}

/// All outcomes of a run, in the order the regions were given.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcomes {
    pub app_id: String,
    pub entries: Vec<RegionOutcome>,
    pub batches: usize,
}

impl BatchOutcomes {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), entries: Vec::new(), batches: 0 }
    }

    /// Records an outcome; builder-style, mostly for tests and replays.
    pub fn with(mut self, region: RegionTarget, outcome: RawFetchOutcome) -> Self {
        self.entries.push(RegionOutcome { region, outcome });
        self
    }

    pub fn get(&self, region_code: &str) -> Option<&RawFetchOutcome> {
        self.entries
            .iter()
            .find(|e| e.region.region_code.eq_ignore_ascii_case(region_code))
            .map(|e| &e.outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionOutcome> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_success()).count()
    }
}

/// Runs region fetches in fixed-size batches.
///
/// Every fetch of a batch runs concurrently; the next batch starts only once
/// all of them have finished. Nothing is retried.
pub struct BatchOrchestrator {
    fetcher: RegionFetcher,
    batch_size: usize,
    pause_ms: u64,
    pause_jitter_ms: u64,
}

impl BatchOrchestrator {
    /// Creates an orchestrator; a batch size of 0 is treated as 1.
    pub fn new(fetcher: RegionFetcher, batch_size: usize) -> Self {
        Self { fetcher, batch_size: batch_size.max(1), pause_ms: 0, pause_jitter_ms: 0 }
    }

    /// Sets the pause between batches.
    pub fn with_pause(mut self, pause_ms: u64, jitter_ms: u64) -> Self {
        self.pause_ms = pause_ms;
        self.pause_jitter_ms = jitter_ms;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetches every region and collects the outcomes in region order.
    pub async fn run(&self, regions: &[RegionTarget], app_id: &AppIdentifier) -> BatchOutcomes {
        let mut outcomes = BatchOutcomes::new(app_id.as_str());
        let total_batches = regions.len().div_ceil(self.batch_size);

        for (index, batch) in regions.chunks(self.batch_size).enumerate() {
            if index > 0 {
                self.pause().await;
            }

            let codes: Vec<&str> = batch.iter().map(|r| r.region_code.as_str()).collect();
            info!("Batch {}/{}: {}", index + 1, total_batches, codes.join(", "));

            let handles: Vec<_> = batch
                .iter()
                .map(|region| {
                    let fetcher = self.fetcher.clone();
                    let region = region.clone();
                    let app_id = app_id.clone();
                    tokio::spawn(async move { fetcher.fetch(&region, &app_id).await })
                })
                .collect();

            for (region, handle) in batch.iter().zip(handles) {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("{}: fetch task failed: {}", region, e);
                        RawFetchOutcome::TransportError { message: format!("task failed: {}", e) }
                    }
                };
                outcomes.entries.push(RegionOutcome { region: region.clone(), outcome });
            }

            outcomes.batches += 1;
        }

        info!(
            "Fetched {} regions in {} batches ({} with offers)",
            outcomes.len(),
            outcomes.batches,
            outcomes.success_count()
        );

        outcomes
    }

    async fn pause(&self) {
        if self.pause_ms == 0 && self.pause_jitter_ms == 0 {
            return;
        }

        let jitter = if self.pause_jitter_ms > 0 {
            rand::rng().random_range(0..=self.pause_jitter_ms)
        } else {
            0
        };

        let total = self.pause_ms + jitter;
        debug!("Pausing {}ms before next batch", total);
        tokio::time::sleep(Duration::from_millis(total)).await;
    }
}
