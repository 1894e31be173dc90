// src/checker/scheduler.rs
// =============================================================================
// Fans a bookmark list out into concurrent probes.
//
// How it works:
// 1. Probes are started in input order until `concurrency` are running
// 2. A `FuturesUnordered` set yields each probe as soon as it finishes
//    (like `buffer_unordered`, but with the dispatch step in our hands)
// 3. Before each new dispatch we look at the cancel token: once cancelled,
//    no new probe starts
// 4. Every finished probe is handed to the callback from this one loop, so
//    callbacks never overlap even though probes run in parallel
//
// After cancellation the loop keeps polling until every in-flight probe has
// actually returned. Nothing outlives `run`.
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::checker::probe::HttpProbe;
use crate::checker::types::{BookmarkRef, ProbeOutcome};

/// Counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Probes that were started
    pub dispatched: usize,
    /// Probes that finished and were delivered to the callback
    pub completed: usize,
    /// Probes stopped by cancellation; never delivered
    pub aborted: usize,
}

impl SchedulerStats {
    pub fn in_flight(&self) -> usize {
        self.dispatched - self.completed - self.aborted
    }
}

pub struct ProbeScheduler {
    probe: Arc<HttpProbe>,
    concurrency: usize,
}

impl ProbeScheduler {
    /// `concurrency` of 0 is treated as 1.
    pub fn new(probe: Arc<HttpProbe>, concurrency: usize) -> Self {
        Self {
            probe,
            concurrency: concurrency.max(1),
        }
    }

    /// Probes every bookmark, calling `on_probe_complete(index, bookmark, outcome)`
    /// once per finished probe, in completion order.
    ///
    /// `index` is the bookmark's position in `bookmarks`.
    pub async fn run<F>(
        &self,
        bookmarks: &[BookmarkRef],
        cancel: &CancellationToken,
        mut on_probe_complete: F,
    ) -> SchedulerStats
    where
        F: FnMut(usize, &BookmarkRef, ProbeOutcome),
    {
        let mut stats = SchedulerStats::default();
        let mut pending = bookmarks.iter().enumerate();
        let mut running = FuturesUnordered::new();

        loop {
            // Fill free slots in input order, unless we've been told to stop
            while running.len() < self.concurrency && !cancel.is_cancelled() {
                let Some((index, bookmark)) = pending.next() else {
                    break;
                };
                stats.dispatched += 1;
                running.push(probe_one(&self.probe, index, bookmark, cancel));
            }

            // Empty only when nothing is running and nothing more will start
            let Some((index, bookmark, outcome)) = running.next().await else {
                break;
            };

            if outcome.was_cancelled() {
                debug!(url = %bookmark.url, "probe aborted by cancellation");
                stats.aborted += 1;
                continue;
            }
            stats.completed += 1;
            on_probe_complete(index, bookmark, outcome);
        }

        stats
    }
}

async fn probe_one<'a>(
    probe: &HttpProbe,
    index: usize,
    bookmark: &'a BookmarkRef,
    cancel: &CancellationToken,
) -> (usize, &'a BookmarkRef, ProbeOutcome) {
    let outcome = probe.probe(&bookmark.url, cancel).await;
    (index, bookmark, outcome)
}
