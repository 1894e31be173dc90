// src/checker/session.rs
// =============================================================================
// One end-to-end favorites check.
//
// This is the only entry point the outside world uses:
//   - start(bookmarks, progress) -> CheckRun     (Idle -> Running)
//   - cancel()                                    (Running -> Cancelling)
//   - CheckRun::finish().await -> CheckResult     (-> Completed | Cancelled)
//
// State changes happen under one short mutex, so nobody ever sees a half
// applied transition. The probes themselves never touch the state; only the
// run task does, once the scheduler has drained.
//
// Progress goes out over a tokio mpsc channel instead of a callback, so the
// consumer can be a UI loop, a terminal printer, or a test.
// =============================================================================

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::checker::aggregator::{CheckReport, ResultAggregator};
use crate::checker::probe::{HttpClient, HttpProbe};
use crate::checker::scheduler::ProbeScheduler;
use crate::checker::types::BookmarkRef;
use crate::config::CheckerConfig;
use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Cancelling,
    Completed,
    Cancelled,
}

/// "N of M checked"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckProgress {
    pub checked: usize,
    pub total: usize,
}

/// What a finished run hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// `Completed` or `Cancelled`
    pub state: SessionState,
    pub report: CheckReport,
}

impl CheckResult {
    /// True when the run was cancelled and the report only covers part of
    /// the bookmarks.
    pub fn is_partial(&self) -> bool {
        self.state == SessionState::Cancelled
    }
}

struct Shared {
    state: SessionState,
    cancel: CancellationToken,
}

pub struct CheckSession {
    probe: Arc<HttpProbe>,
    concurrency: usize,
    shared: Arc<Mutex<Shared>>,
}

impl CheckSession {
    pub fn new(client: Arc<dyn HttpClient>, config: &CheckerConfig) -> Self {
        let probe = HttpProbe::new(client, config.per_request_timeout, config.max_redirects);
        Self {
            probe: Arc::new(probe),
            concurrency: config.concurrency,
            shared: Arc::new(Mutex::new(Shared {
                state: SessionState::Idle,
                cancel: CancellationToken::new(),
            })),
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared).state
    }

    /// Starts checking `bookmarks` in the background.
    ///
    /// Must be called inside a tokio runtime. Fails with `AlreadyRunning` if a
    /// check is running or still draining; a finished session can be started
    /// again.
    pub fn start(
        &self,
        bookmarks: Vec<BookmarkRef>,
        progress: Option<UnboundedSender<CheckProgress>>,
    ) -> Result<CheckRun, SessionError> {
        let cancel = {
            let mut shared = lock(&self.shared);
            if matches!(shared.state, SessionState::Running | SessionState::Cancelling) {
                return Err(SessionError::AlreadyRunning);
            }
            shared.state = SessionState::Running;
            shared.cancel = CancellationToken::new();
            shared.cancel.clone()
        };

        info!(total = bookmarks.len(), concurrency = self.concurrency, "favorites check started");

        let scheduler = ProbeScheduler::new(Arc::clone(&self.probe), self.concurrency);
        let shared = Arc::clone(&self.shared);

        let handle = tokio::spawn(async move {
            let total = bookmarks.len();
            let mut aggregator = ResultAggregator::new(total);

            let stats = scheduler
                .run(&bookmarks, &cancel, |index, bookmark, outcome| {
                    if outcome.is_broken() {
                        warn!(url = %bookmark.url, status = %outcome.label(), "favorite is broken");
                    }
                    aggregator.record(index, bookmark, outcome);
                    if let Some(tx) = &progress {
                        // The receiver going away just means nobody is watching
                        let _ = tx.send(CheckProgress {
                            checked: aggregator.checked(),
                            total,
                        });
                    }
                })
                .await;

            let report = aggregator.finalize();
            let state = {
                let mut shared = lock(&shared);
                shared.state = settled_state(shared.state, &report, stats.aborted);
                shared.state
            };

            info!(
                ?state,
                checked = report.checked(),
                total,
                broken = report.broken_count,
                aborted = stats.aborted,
                "favorites check finished"
            );
            CheckResult { state, report }
        });

        Ok(CheckRun { handle })
    }

    /// Asks a running check to stop.
    ///
    /// No new probes are started; in-flight ones are aborted. The session
    /// becomes `Cancelled` once they have all returned, which the caller
    /// observes through `CheckRun::finish`. A cancel that arrives after every
    /// bookmark already has an outcome leaves the run `Completed`.
    pub fn cancel(&self) -> Result<(), SessionError> {
        let mut shared = lock(&self.shared);
        match shared.state {
            SessionState::Running => {
                info!("cancelling favorites check");
                shared.state = SessionState::Cancelling;
                shared.cancel.cancel();
                Ok(())
            }
            SessionState::Cancelling => Ok(()),
            SessionState::Idle | SessionState::Completed | SessionState::Cancelled => {
                Err(SessionError::NotRunning)
            }
        }
    }
}

/// Handle to a run started with `CheckSession::start`.
pub struct CheckRun {
    handle: JoinHandle<CheckResult>,
}

impl CheckRun {
    /// Waits for the run to finish and returns its report.
    ///
    /// A panic inside the run (a broken invariant) is re-raised here.
    pub async fn finish(self) -> Result<CheckResult, SessionError> {
        match self.handle.await {
            Ok(result) => Ok(result),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(SessionError::Interrupted),
        }
    }
}

// A cancel that lands after every bookmark already has an outcome changes
// nothing in the report, so the run still counts as completed
pub(super) fn settled_state(current: SessionState, report: &CheckReport, aborted: usize) -> SessionState {
    let whole = aborted == 0 && report.checked() == report.total;
    match current {
        SessionState::Cancelling if !whole => SessionState::Cancelled,
        _ => SessionState::Completed,
    }
}

// State updates never panic mid-way, so a poisoned lock still holds a
// consistent state
fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
