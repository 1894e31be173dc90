// src/checker/types.rs
// =============================================================================
// Data shared by every stage of a favorites check.
//
// - BookmarkRef: one favorite handed to us by the bookmark store
// - ProbeOutcome: what happened when we probed its URL
// - TransportError: why a probe never got an HTTP answer
//
// All of these are plain immutable values once created. They derive
// Serialize so a whole report can be written out as JSON.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// A favorite as supplied by the bookmark store.
///
/// The checker only reads these. Tags are kept in a `BTreeSet` so two equal
/// bookmarks always serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRef {
    pub url: Url,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl BookmarkRef {
    pub fn new(url: Url, title: impl Into<String>) -> Self {
        Self {
            url,
            title: title.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Why a probe ended without a usable HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportError {
    /// The probe ran past its deadline
    Timeout,
    /// Could not resolve hostname
    Dns,
    /// Connection refused, reset, unreachable...
    Connect,
    /// TLS handshake or certificate problem
    Tls,
    /// Not an http(s) URL, so there is nothing to probe
    UnsupportedScheme(String),
    /// The probe was aborted because the session is being cancelled
    Cancelled,
    /// Anything else the HTTP client reported
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => f.write_str("timeout"),
            TransportError::Dns => f.write_str("could not resolve hostname"),
            TransportError::Connect => f.write_str("connection failed"),
            TransportError::Tls => f.write_str("TLS error"),
            TransportError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported scheme '{}'", scheme)
            }
            TransportError::Cancelled => f.write_str("cancelled"),
            TransportError::Other(message) => f.write_str(message),
        }
    }
}

/// The classified result of probing one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Answered 2xx without any redirect
    Accessible {
        http_status: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        content_length: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_modified: Option<DateTime<Utc>>,
    },
    /// Answered 2xx after following at least one redirect
    Redirected { final_url: Url, http_status: u16 },
    /// Anything else: bad status, redirect loop, transport failure
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transport_error: Option<TransportError>,
    },
}

impl ProbeOutcome {
    pub fn failed_status(status: u16) -> Self {
        ProbeOutcome::Failed {
            http_status: Some(status),
            transport_error: None,
        }
    }

    pub fn failed_transport(error: TransportError) -> Self {
        ProbeOutcome::Failed {
            http_status: None,
            transport_error: Some(error),
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, ProbeOutcome::Failed { .. })
    }

    /// True when the probe was aborted by cancellation rather than finishing.
    pub fn was_cancelled(&self) -> bool {
        matches!(
            self,
            ProbeOutcome::Failed {
                transport_error: Some(TransportError::Cancelled),
                ..
            }
        )
    }

    /// Short label used to group broken favorites ("HTTP 404", "timeout").
    pub fn label(&self) -> String {
        match self {
            ProbeOutcome::Accessible { http_status, .. } => format!("HTTP {}", http_status),
            ProbeOutcome::Redirected { http_status, .. } => format!("HTTP {}", http_status),
            ProbeOutcome::Failed {
                transport_error: Some(error),
                ..
            } => error.to_string(),
            ProbeOutcome::Failed {
                http_status: Some(status),
                ..
            } => format!("HTTP {}", status),
            ProbeOutcome::Failed { .. } => "unknown error".to_string(),
        }
    }
}
