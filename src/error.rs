// src/error.rs
// =============================================================================
// Typed errors returned by the library.
//
// Per-URL problems (404s, timeouts, DNS...) are NOT errors: they become a
// ProbeOutcome::Failed inside the report. Only misuse of the API ends up here.
// =============================================================================

use thiserror::Error;

/// Rejected session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start` while a check is still running or draining
    #[error("already checking links, please wait")]
    AlreadyRunning,
    /// `cancel` with no check in progress
    #[error("no check is running")]
    NotRunning,
    /// The run task was torn down before it could report (runtime shutdown)
    #[error("check was interrupted before it could finish")]
    Interrupted,
}

/// Invalid checker settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("per-request timeout must be greater than zero")]
    ZeroTimeout,
}
