//! Typed errors for the discovery library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the discovery pipeline.
///
/// `DiscoveryOrchestrator::search` only ever returns `Config`; search
/// failures are absorbed by the strict/relaxed fallback. `Search` is
/// returned by callers that drive the `SearchExecutor` directly.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Policy or request is malformed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Every configured backend failed for a query
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Configuration problems detected before any network attempt.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Request failed validation
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Domain policy failed validation
    #[error("invalid domain policy: {reason}")]
    InvalidPolicy { reason: String },

    /// Policy file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Policy file is not valid JSON for the expected shape
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Backend name not recognised
    #[error("unknown search backend: {0}")]
    UnknownBackend(String),

    /// Executor built with an empty backend list
    #[error("no search backends configured")]
    NoBackends,

    /// A requested backend needs credentials that were not supplied
    #[error("missing credential for {backend}: {name}")]
    MissingCredential {
        backend: &'static str,
        name: &'static str,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A single failed call to a search backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Anti-bot challenge page (captcha, "unusual traffic")
    #[error("challenge page detected: {detail}")]
    Challenge { detail: String },

    /// Attempt exceeded the per-call deadline
    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    /// Response body could not be interpreted
    #[error("unexpected response: {0}")]
    Parse(String),

    /// Blocking worker panicked or was cancelled
    #[error("worker failed: {0}")]
    Worker(String),
}

impl BackendError {
    /// Wrap any transport error.
    pub fn http(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Http(Box::new(err))
    }

    /// Wrap a reqwest error with its URL removed. Used where the URL
    /// carries a credential in the query string.
    pub fn http_redacted(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err.without_url()))
    }
}

/// How a backend failure is treated by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider asked us to slow down; retried in place
    RateLimited,
    /// Provider refused to serve us (captcha, bot wall)
    Blocked,
    /// Anything else
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::RateLimited => "rate limited",
            FailureKind::Blocked => "blocked",
            FailureKind::Other => "failed",
        })
    }
}

/// Record of a backend that was abandoned.
#[derive(Debug, Error)]
#[error("{backend} {kind} after {attempts} attempt(s): {error}")]
pub struct BackendFailure {
    pub backend: &'static str,
    pub kind: FailureKind,
    pub attempts: u32,
    #[source]
    pub error: BackendError,
}

/// All configured backends were exhausted for one query.
#[derive(Debug, Error)]
#[error("all search backends failed for query {query:?}: {last}")]
pub struct SearchError {
    pub query: String,
    /// Failures from earlier backends, in the order they were tried
    pub earlier: Vec<BackendFailure>,
    /// The final backend's failure
    #[source]
    pub last: Box<BackendFailure>,
}

impl SearchError {
    /// The last underlying backend error.
    pub fn last_error(&self) -> &BackendError {
        &self.last.error
    }

    /// Every failure, oldest first.
    pub fn failures(&self) -> impl Iterator<Item = &BackendFailure> {
        self.earlier.iter().chain(std::iter::once(self.last.as_ref()))
    }

    /// True when at least one backend refused us rather than failing.
    pub fn was_blocked(&self) -> bool {
        self.failures().any(|f| f.kind == FailureKind::Blocked)
    }
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for configuration checks.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for a single backend call.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
