// src/checker/mod.rs
// =============================================================================
// This module contains the favorites reachability checker.
//
// Submodules, leaves first:
// - types: bookmarks and probe outcomes
// - probe: checks one URL (HEAD, GET fallback, redirects, timeout, cancel)
// - scheduler: runs many probes with a concurrency cap
// - aggregator: sorts outcomes into accessible / redirected / broken
// - session: the start / cancel / finish state machine callers use
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of the crate can use.
// =============================================================================

mod aggregator;
mod probe;
mod scheduler;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod regressions;

// Re-export public items from submodules
// This lets users write `checker::CheckSession` instead of
// `checker::session::CheckSession`
pub use aggregator::{CheckReport, ReportEntry, ResultAggregator};
pub use probe::{HttpClient, HttpProbe, ProbeMethod, ProbeResponse, ReqwestClient};
pub use scheduler::{ProbeScheduler, SchedulerStats};
pub use session::{CheckProgress, CheckResult, CheckRun, CheckSession, SessionState};
pub use types::{BookmarkRef, ProbeOutcome, TransportError};
