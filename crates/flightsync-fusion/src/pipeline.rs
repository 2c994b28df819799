//! Fusion pipeline.
//!
//! Consumes [`FeedBatch`]es from any feed in any order, merges each fragment
//! into the [`EntityStore`] and emits a [`FusionEvent`] every time the merged
//! record passes the completeness gate. A record that is already complete
//! emits again on every further merge, so position updates keep flowing.
//!
//! The pipeline holds no locks: it is owned by a single consumer task that
//! receives every feed's output.

use std::time::Instant;

use flightsync_types::{CompleteAircraft, FeedBatch, IcaoCode};
use tracing::debug;

use crate::store::{EntityStore, RetentionPolicy, try_complete};

/// A complete aircraft produced by one merge.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionEvent {
    pub aircraft: CompleteAircraft,
    /// Running total of merges performed by the pipeline, diagnostics only.
    pub merges: u64,
}

/// Counters for the status line: `complete/total/merges`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FusionStatus {
    pub complete: usize,
    pub total: usize,
    pub merges: u64,
}

#[derive(Debug)]
pub struct FusionPipeline {
    store: EntityStore,
    merges: u64,
    enabled: bool,
}

impl Default for FusionPipeline {
    fn default() -> Self {
        Self::new(RetentionPolicy::Unbounded)
    }
}

impl FusionPipeline {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            store: EntityStore::new(retention),
            merges: 0,
            enabled: true,
        }
    }

    /// Merge every fragment of `batch` and return the completions, in
    /// fragment order. Returns nothing while the pipeline is disabled.
    pub fn ingest(&mut self, batch: &FeedBatch, now: Instant) -> Vec<FusionEvent> {
        if !self.enabled {
            debug!(feed = %batch.feed, fragments = batch.fragments.len(), "pipeline disabled, batch ignored");
            return Vec::new();
        }

        let mut events = Vec::new();
        for fragment in &batch.fragments {
            let record = self.store.merge(fragment, now);
            self.merges += 1;
            if let Some(aircraft) = try_complete(record) {
                events.push(FusionEvent {
                    aircraft,
                    merges: self.merges,
                });
            }
        }

        debug!(
            feed = %batch.feed,
            fragments = batch.fragments.len(),
            completed = events.len(),
            merges = self.merges,
            "batch ingested"
        );
        events
    }

    /// Turn batch processing on or off. Already stored records are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> FusionStatus {
        FusionStatus {
            complete: self.store.complete_count(),
            total: self.store.len(),
            merges: self.merges,
        }
    }

    pub fn evict_stale(&mut self, now: Instant) -> Vec<IcaoCode> {
        self.store.evict_stale(now)
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }
}
