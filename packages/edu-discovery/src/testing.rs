//! Testing utilities including scripted backends.
//!
//! These are useful for testing applications that use the discovery
//! library without making real network calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{BackendError, BackendResult};
use crate::traits::backend::{SearchBackend, SearchQuery};
use crate::types::result::RawHit;

/// One scripted backend response.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with these hits (possibly none)
    Hits(Vec<RawHit>),
    /// HTTP 429
    RateLimited,
    /// Transport failure with this message
    Fail(String),
    /// Captcha interstitial
    Challenge,
}

impl Script {
    fn into_result(self) -> BackendResult<Vec<RawHit>> {
        match self {
            Script::Hits(hits) => Ok(hits),
            Script::RateLimited => Err(BackendError::Status {
                status: 429,
                body: "Too Many Requests".into(),
            }),
            Script::Fail(message) => Err(BackendError::http(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            ))),
            Script::Challenge => Err(BackendError::Challenge {
                detail: "captcha form in response".into(),
            }),
        }
    }
}

/// Record of a call made to a scripted backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub query: SearchQuery,
    pub at: Instant,
}

/// Shared view of a backend's call history.
///
/// Cloned out of the backend before it is moved into an executor.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl CallLog {
    fn record(&self, query: &SearchQuery) {
        let mut calls = self.calls.write().unwrap_or_else(|e| e.into_inner());
        calls.push(RecordedCall {
            query: query.clone(),
            at: Instant::now(),
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.calls.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query strings, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.query.text).collect()
    }

    /// When each call happened, relative to `start`.
    pub fn offsets_from(&self, start: Instant) -> Vec<Duration> {
        self.calls()
            .iter()
            .map(|c| c.at.saturating_duration_since(start))
            .collect()
    }
}

type Responder = dyn Fn(&SearchQuery) -> Script + Send + Sync;

/// A backend that plays back queued responses.
///
/// Responses are consumed in order. Once the queue is empty the
/// `always` response (or an empty answer) is used for every call.
pub struct ScriptedBackend {
    name: &'static str,
    queue: Mutex<VecDeque<Script>>,
    fallback: Option<Script>,
    responder: Option<Box<Responder>>,
    latency: Duration,
    calls: CallLog,
}

impl ScriptedBackend {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            queue: Mutex::new(VecDeque::new()),
            fallback: None,
            responder: None,
            latency: Duration::ZERO,
            calls: CallLog::default(),
        }
    }

    /// Queue one response.
    pub fn then(self, script: Script) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(script);
        self
    }

    /// Response used once the queue is drained.
    pub fn always(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    /// Decide the response from the query once the queue is drained.
    pub fn respond_with(
        mut self,
        responder: impl Fn(&SearchQuery) -> Script + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Sleep this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    fn next_script(&self, query: &SearchQuery) -> Script {
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(script) = queued {
            return script;
        }
        if let Some(responder) = &self.responder {
            return responder(query);
        }
        self.fallback.clone().unwrap_or(Script::Hits(vec![]))
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        self.calls.record(query);
        let script = self.next_script(query);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        script.into_result()
    }
}

/// Shorthand for a hit with a title derived from the URL.
pub fn hit(url: &str) -> RawHit {
    RawHit::new(url).with_title(format!("Result for {}", url))
}
