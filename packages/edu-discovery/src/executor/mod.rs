//! Search execution across backends.
//!
//! The executor owns an ordered list of backends. For one query it:
//!
//! - tries the first backend; a rate-limit answer is retried in place
//!   with exponential backoff (`base_delay * 2^attempt` plus jitter) up
//!   to `max_attempts`
//! - abandons a backend on any other failure, or once retries run out,
//!   and moves to the next one
//! - returns the first success, including an empty one
//! - fails with `SearchError` only when every backend has been abandoned
//!
//! Every attempt runs under `call_timeout`; a timeout is a hard failure.
//! Backoff sleeps belong to the call that hit the limit, so concurrent
//! discovery calls never wait on each other.

pub mod classify;

pub use classify::{classify_failure, looks_like_challenge};

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{
    BackendError, BackendFailure, ConfigError, ConfigResult, FailureKind, SearchError,
};
use crate::traits::backend::{SearchBackend, SearchQuery};
use crate::types::config::ExecutorConfig;
use crate::types::result::RawHit;

pub struct SearchExecutor {
    backends: Vec<Arc<dyn SearchBackend>>,
    config: ExecutorConfig,
}

impl std::fmt::Debug for SearchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchExecutor")
            .field("backends", &self.backend_names())
            .field("config", &self.config)
            .finish()
    }
}

impl SearchExecutor {
    /// Build an executor over backends in priority order.
    pub fn new(backends: Vec<Arc<dyn SearchBackend>>, config: ExecutorConfig) -> ConfigResult<Self> {
        if backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }
        Ok(Self { backends, config })
    }

    /// Executor over a single backend with default settings.
    pub fn single(backend: impl SearchBackend + 'static) -> Self {
        Self {
            backends: vec![Arc::new(backend)],
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Check that `name` refers to a configured backend.
    pub fn check_backend(&self, name: &str) -> ConfigResult<()> {
        if self.backends.iter().any(|b| b.name().eq_ignore_ascii_case(name)) {
            Ok(())
        } else {
            Err(ConfigError::UnknownBackend(name.to_string()))
        }
    }

    /// Run `query` in priority order.
    pub async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawHit>, SearchError> {
        self.fetch_preferring(query, None).await
    }

    /// Run `query`, trying the named backend first.
    ///
    /// The other backends are consulted only if the preferred one fails.
    /// An empty answer from the preferred backend is returned as is.
    pub async fn fetch_preferring(
        &self,
        query: &SearchQuery,
        preferred: Option<&str>,
    ) -> Result<Vec<RawHit>, SearchError> {
        let mut failures: Vec<BackendFailure> = Vec::new();

        for backend in self.ordered(preferred) {
            match self.run_backend(backend.as_ref(), query).await {
                Ok(hits) => {
                    if !failures.is_empty() {
                        info!(
                            backend = backend.name(),
                            failed_before = failures.len(),
                            "Fallback backend answered"
                        );
                    }
                    return Ok(hits);
                }
                Err(failure) => {
                    warn!(
                        backend = failure.backend,
                        kind = %failure.kind,
                        attempts = failure.attempts,
                        error = %failure.error,
                        "Backend abandoned"
                    );
                    failures.push(failure);
                }
            }
        }

        // Construction guarantees at least one backend, hence one failure.
        let last = failures.pop().unwrap_or_else(|| BackendFailure {
            backend: "none",
            kind: FailureKind::Other,
            attempts: 0,
            error: BackendError::Parse("no backend was attempted".into()),
        });

        Err(SearchError {
            query: query.text.clone(),
            earlier: failures,
            last: Box::new(last),
        })
    }

    fn ordered(&self, preferred: Option<&str>) -> Vec<&Arc<dyn SearchBackend>> {
        let mut ordered: Vec<_> = self.backends.iter().collect();
        if let Some(name) = preferred {
            if let Some(pos) = ordered.iter().position(|b| b.name().eq_ignore_ascii_case(name)) {
                let chosen = ordered.remove(pos);
                ordered.insert(0, chosen);
            } else {
                warn!(backend = name, "Preferred backend not configured; using default order");
            }
        }
        ordered
    }

    async fn run_backend(
        &self,
        backend: &dyn SearchBackend,
        query: &SearchQuery,
    ) -> Result<Vec<RawHit>, BackendFailure> {
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            debug!(backend = backend.name(), attempt, "Searching");

            let outcome = match tokio::time::timeout(self.config.call_timeout, backend.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout {
                    after: self.config.call_timeout,
                }),
            };

            let error = match outcome {
                Ok(hits) => {
                    debug!(backend = backend.name(), hits = hits.len(), "Backend answered");
                    return Ok(hits);
                }
                Err(e) => e,
            };

            let kind = classify_failure(&error);
            attempt += 1;

            if kind == FailureKind::RateLimited && attempt < max_attempts {
                let delay = retry.delay_for(attempt - 1);
                info!(
                    backend = backend.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited; backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if kind == FailureKind::Blocked {
                warn!(backend = backend.name(), error = %error, "Search blocked by provider challenge");
            }

            return Err(BackendFailure {
                backend: backend.name(),
                kind,
                attempts: attempt,
                error,
            });
        }
    }
}
