//! Favorites reachability checker.
//!
//! Give it the user's bookmarks and it probes every URL concurrently, follows
//! redirects, copes with dead servers, can be cancelled mid-run, and hands
//! back one report that splits the bookmarks into accessible, redirected and
//! broken.
//!
//! ```no_run
//! # async fn demo(bookmarks: Vec<favorites_checker::BookmarkRef>) -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use favorites_checker::{CheckSession, CheckerConfig, ReqwestClient};
//!
//! let config = CheckerConfig::default();
//! let client = ReqwestClient::new(&config)?;
//! let session = CheckSession::new(Arc::new(client), &config);
//!
//! let result = session.start(bookmarks, None)?.finish().await?;
//! println!("{}", favorites_checker::report::render_summary(&result));
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod report;
pub mod store;

pub use checker::{
    BookmarkRef, CheckProgress, CheckReport, CheckResult, CheckRun, CheckSession, HttpClient,
    ProbeOutcome, ReqwestClient, SessionState, TransportError,
};
pub use config::CheckerConfig;
pub use error::{ConfigError, SessionError};
