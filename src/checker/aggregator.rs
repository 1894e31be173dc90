// src/checker/aggregator.rs
// =============================================================================
// Collects probe outcomes into a CheckReport.
//
// The aggregator is fed from the scheduler's completion loop only, one call at
// a time, so it is a plain struct with no locking of its own.
//
// Detail lists are in COMPLETION order (the order outcomes were recorded),
// not in bookmark order. That is intentional: probes finish in whatever order
// the remote servers answer.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::checker::types::{BookmarkRef, ProbeOutcome};

/// One favorite together with what its probe found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub bookmark: BookmarkRef,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

/// Summary of a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Number of bookmarks submitted, checked or not
    pub total: usize,
    pub accessible_count: usize,
    pub redirected_count: usize,
    pub broken_count: usize,
    pub broken_details: Vec<ReportEntry>,
    pub redirected_details: Vec<ReportEntry>,
    /// Carries the content length and last-modified each server advertised
    pub accessible_details: Vec<ReportEntry>,
}

impl CheckReport {
    /// How many bookmarks actually finished a probe.
    pub fn checked(&self) -> usize {
        self.accessible_count + self.redirected_count + self.broken_count
    }
}

#[derive(Debug, Default)]
pub struct ResultAggregator {
    report: CheckReport,
    recorded: HashSet<usize>,
}

impl ResultAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            report: CheckReport {
                total,
                ..CheckReport::default()
            },
            recorded: HashSet::new(),
        }
    }

    /// Adds the outcome for the bookmark at input position `index`.
    ///
    /// # Panics
    ///
    /// If `index` was already recorded. The scheduler probes each bookmark
    /// once, so a repeat means a bug upstream.
    pub fn record(&mut self, index: usize, bookmark: &BookmarkRef, outcome: ProbeOutcome) {
        assert!(
            self.recorded.insert(index),
            "bookmark #{} ({}) recorded twice",
            index,
            bookmark.url
        );

        let entry = |outcome| ReportEntry {
            bookmark: bookmark.clone(),
            outcome,
        };

        match outcome {
            ProbeOutcome::Accessible { .. } => {
                self.report.accessible_count += 1;
                self.report.accessible_details.push(entry(outcome));
            }
            ProbeOutcome::Redirected { .. } => {
                self.report.redirected_count += 1;
                self.report.redirected_details.push(entry(outcome));
            }
            ProbeOutcome::Failed { .. } => {
                self.report.broken_count += 1;
                self.report.broken_details.push(entry(outcome));
            }
        }
    }

    pub fn checked(&self) -> usize {
        self.report.checked()
    }

    /// Snapshot of everything recorded so far.
    pub fn finalize(&self) -> CheckReport {
        self.report.clone()
    }
}
