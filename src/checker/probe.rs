// src/checker/probe.rs
// =============================================================================
// This module checks whether ONE favorite is still reachable.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to a one-byte ranged GET if the server rejects HEAD (405/501)
// - Follows redirects itself, in a plain loop, so the hop count is bounded
//   and the cancel token is checked between hops
// - Turns every way of ending (status, transport error, timeout, cancel)
//   into a ProbeOutcome; nothing escapes as an error
//
// The network is behind the `HttpClient` trait. Production code uses
// `ReqwestClient`; tests plug in a scripted fake.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderName, CONTENT_LENGTH, CONTENT_RANGE, LAST_MODIFIED, LOCATION, RANGE};
use reqwest::{redirect, Client, Method, StatusCode};
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::CheckerConfig;
use crate::checker::types::{ProbeOutcome, TransportError};

/// The two kinds of request a probe can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    Head,
    /// GET asking for the first byte only (`Range: bytes=0-0`)
    RangedGet,
}

/// The parts of an HTTP response a probe cares about.
///
/// Header values are kept raw; parsing them is the probe's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub location: Option<String>,
    pub content_length: Option<String>,
    pub content_range: Option<String>,
    pub last_modified: Option<String>,
}

impl ProbeResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Sends a single request, never following redirects.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, method: ProbeMethod, url: &Url) -> Result<ProbeResponse, TransportError>;
}

/// `HttpClient` backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(config: &CheckerConfig) -> Result<Self, reqwest::Error> {
        // Redirects are followed by HttpProbe, so reqwest must hand us every 3xx
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .timeout(config.per_request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, method: ProbeMethod, url: &Url) -> Result<ProbeResponse, TransportError> {
        let request = match method {
            ProbeMethod::Head => self.client.request(Method::HEAD, url.clone()),
            ProbeMethod::RangedGet => self.client.get(url.clone()).header(RANGE, "bytes=0-0"),
        };

        let response = request.send().await.map_err(categorize_error)?;

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            location: header(LOCATION),
            content_length: header(CONTENT_LENGTH),
            content_range: header(CONTENT_RANGE),
            last_modified: header(LAST_MODIFIED),
        })
        // The response body is dropped unread; for HEAD there is none and for
        // the ranged GET it is at most one byte.
    }
}

// Categorizes the different error types from reqwest
fn categorize_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout;
    }

    // reqwest doesn't expose DNS/TLS as separate kinds, so look at the text
    // of the source chain. The top-level message carries the URL and must
    // stay out of the keyword match.
    let causes = source_chain(&error).to_lowercase();
    let mentions_tls =
        causes.contains("certificate") || causes.contains("tls") || causes.contains("ssl");

    if error.is_connect() {
        if causes.contains("dns") || causes.contains("resolve") {
            TransportError::Dns
        } else if mentions_tls {
            TransportError::Tls
        } else {
            TransportError::Connect
        }
    } else if mentions_tls {
        TransportError::Tls
    } else {
        TransportError::Other(error.to_string())
    }
}

fn source_chain(error: &reqwest::Error) -> String {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(inner) = source {
        causes.push(inner.to_string());
        source = inner.source();
    }
    causes.join(": ")
}

/// Probes one URL at a time with fixed timeout and redirect settings.
///
/// Cheap to share: the scheduler holds one probe and calls it for every
/// favorite.
#[derive(Clone)]
pub struct HttpProbe {
    client: Arc<dyn HttpClient>,
    timeout: Duration,
    max_redirects: usize,
}

impl HttpProbe {
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration, max_redirects: usize) -> Self {
        Self {
            client,
            timeout,
            max_redirects,
        }
    }

    /// Probes `url`, following up to `max_redirects` redirects.
    ///
    /// The whole probe is bounded by the configured timeout. If `cancel` fires
    /// the in-flight request is dropped and `Failed { Cancelled }` comes back.
    pub async fn probe(&self, url: &Url, cancel: &CancellationToken) -> ProbeOutcome {
        if !matches!(url.scheme(), "http" | "https") {
            return ProbeOutcome::failed_transport(TransportError::UnsupportedScheme(
                url.scheme().to_string(),
            ));
        }

        match tokio::time::timeout(self.timeout, self.follow(url, cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(%url, "probe timed out");
                ProbeOutcome::failed_transport(TransportError::Timeout)
            }
        }
    }

    async fn follow(&self, start: &Url, cancel: &CancellationToken) -> ProbeOutcome {
        let mut current = start.clone();
        let mut method = ProbeMethod::Head;
        let mut redirects = 0usize;

        loop {
            if cancel.is_cancelled() {
                return ProbeOutcome::failed_transport(TransportError::Cancelled);
            }

            debug!(url = %current, ?method, redirects, "probe hop");
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return ProbeOutcome::failed_transport(TransportError::Cancelled);
                }
                result = self.client.send(method, &current) => result,
            };

            let response = match result {
                Ok(response) => response,
                Err(error) => return ProbeOutcome::failed_transport(error),
            };

            let status = match StatusCode::from_u16(response.status) {
                Ok(status) => status,
                Err(_) => return ProbeOutcome::failed_status(response.status),
            };

            // Some servers refuse HEAD; retry the same hop with a tiny GET
            if method == ProbeMethod::Head
                && matches!(status, StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED)
            {
                debug!(url = %current, status = status.as_u16(), "HEAD rejected, falling back to GET");
                method = ProbeMethod::RangedGet;
                continue;
            }

            if status.is_success() {
                return if redirects == 0 {
                    ProbeOutcome::Accessible {
                        http_status: status.as_u16(),
                        content_length: content_length(&response),
                        last_modified: response.last_modified.as_deref().and_then(parse_http_date),
                    }
                } else {
                    ProbeOutcome::Redirected {
                        final_url: current,
                        http_status: status.as_u16(),
                    }
                };
            }

            if !status.is_redirection() {
                return ProbeOutcome::failed_status(status.as_u16());
            }

            redirects += 1;
            if redirects > self.max_redirects {
                debug!(url = %start, redirects, "too many redirects");
                return ProbeOutcome::failed_status(status.as_u16());
            }

            // A 3xx we can't follow (304, missing or garbage Location) is a dead end
            let next = response
                .location
                .as_deref()
                .and_then(|location| current.join(location).ok());
            match next {
                Some(next) => current = next,
                None => return ProbeOutcome::failed_status(status.as_u16()),
            }
        }
    }
}

// For a ranged answer the full size is the part after '/' in Content-Range
fn content_length(response: &ProbeResponse) -> Option<u64> {
    let from_range = response
        .content_range
        .as_deref()
        .and_then(|range| range.rsplit_once('/'))
        .and_then(|(_, total)| total.trim().parse().ok());

    from_range.or_else(|| {
        response
            .content_length
            .as_deref()
            .and_then(|len| len.trim().parse().ok())
    })
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
