// src/checker/testing.rs
// =============================================================================
// A scripted, in-memory HttpClient for tests.
//
// Each URL gets a little script of steps that runs on every request to it,
// optionally narrowed to one request method.
// Scripts are stateless, so the same client answers the same way every time.
// The client also keeps a liveness counter: how many requests are in flight
// right now and the most that ever were at once.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::checker::probe::{HttpClient, HttpProbe, ProbeMethod, ProbeResponse};
use crate::checker::types::{ProbeOutcome, TransportError};

// Short names used by the regression suite
pub use crate::checker::probe::{
    HttpProbe as UrlChecker, ProbeMethod as Method, ProbeResponse as Reply,
};
pub use crate::checker::types::ProbeOutcome as Outcome;

#[derive(Debug, Clone)]
pub enum Step {
    /// Sleep (tokio time, so paused clocks work)
    Delay(Duration),
    /// Block until the token is cancelled
    Gate(CancellationToken),
    /// Never answer
    Hang,
    /// Cancel the token and carry on with the next step
    Trigger(CancellationToken),
    Respond(ProbeResponse),
    Fail(TransportError),
}

#[derive(Default)]
struct Liveness {
    current: AtomicUsize,
    max: AtomicUsize,
}

// Decrements the in-flight count even when the request future is dropped
struct InFlight<'a>(&'a Liveness);

impl<'a> InFlight<'a> {
    fn enter(liveness: &'a Liveness) -> Self {
        let now = liveness.current.fetch_add(1, Ordering::SeqCst) + 1;
        liveness.max.fetch_max(now, Ordering::SeqCst);
        Self(liveness)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default, Clone)]
pub struct ScriptedClient {
    scripts: HashMap<String, Vec<Step>>,
    method_scripts: HashMap<(ProbeMethod, String), Vec<Step>>,
    fallback: Option<Vec<Step>>,
    liveness: Arc<Liveness>,
    calls: Arc<Mutex<Vec<(ProbeMethod, Url)>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, url: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(normalize(url), steps);
        self
    }

    /// Script that only applies to one request method; wins over `script`.
    pub fn script_for(mut self, method: ProbeMethod, url: &str, steps: Vec<Step>) -> Self {
        self.method_scripts.insert((method, normalize(url)), steps);
        self
    }

    pub fn respond(self, url: &str, response: ProbeResponse) -> Self {
        self.script(url, vec![Step::Respond(response)])
    }

    pub fn redirect(self, url: &str, status: u16, location: &str) -> Self {
        let response = ProbeResponse {
            status,
            location: Some(location.to_string()),
            ..ProbeResponse::default()
        };
        self.respond(url, response)
    }

    pub fn fail(self, url: &str, error: TransportError) -> Self {
        self.script(url, vec![Step::Fail(error)])
    }

    /// Script used for any URL without its own. Unknown URLs otherwise get 404.
    pub fn otherwise(mut self, steps: Vec<Step>) -> Self {
        self.fallback = Some(steps);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(ProbeMethod, Url)>>> {
        Arc::clone(&self.calls)
    }

    pub fn in_flight(&self) -> usize {
        self.liveness.current.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.liveness.max.load(Ordering::SeqCst)
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn send(&self, method: ProbeMethod, url: &Url) -> Result<ProbeResponse, TransportError> {
        let _guard = InFlight::enter(&self.liveness);
        self.calls.lock().unwrap().push((method, url.clone()));

        let steps = self
            .method_scripts
            .get(&(method, url.to_string()))
            .or_else(|| self.scripts.get(url.as_str()))
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| vec![Step::Respond(ProbeResponse::with_status(404))]);

        for step in steps {
            match step {
                Step::Delay(duration) => tokio::time::sleep(duration).await,
                Step::Gate(gate) => gate.cancelled().await,
                Step::Hang => std::future::pending::<()>().await,
                Step::Trigger(token) => token.cancel(),
                Step::Respond(response) => return Ok(response),
                Step::Fail(error) => return Err(error),
            }
        }
        Err(TransportError::Other("script ended without an answer".into()))
    }
}

/// A checker over `client` with a 5s timeout.
pub fn checker(client: ScriptedClient, max_redirects: usize) -> HttpProbe {
    HttpProbe::new(Arc::new(client), Duration::from_secs(5), max_redirects)
}

pub async fn check(checker: &HttpProbe, url: &str, cancel: &CancellationToken) -> ProbeOutcome {
    checker.probe(&Url::parse(url).unwrap(), cancel).await
}

/// Methods of every request the client saw, in order.
pub fn methods(client: &ScriptedClient) -> Vec<ProbeMethod> {
    client.calls().lock().unwrap().iter().map(|(m, _)| *m).collect()
}
