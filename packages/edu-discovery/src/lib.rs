//! Educational Source Discovery Library
//!
//! Finds candidate web sources for a grade/subject/topic request and
//! returns a ranked, deduplicated, trust-annotated list of URLs for
//! downstream fetching.
//!
//! # Pipeline
//!
//! ```text
//! DiscoveryRequest
//!   → DomainResolver   core + band/subject + reference + extra domains
//!   → QueryBuilder     quoted terms, keyword hints, exclusions, site filter
//!   → SearchExecutor   backend rotation, rate-limit backoff, per-call timeout
//!   → ResultFilter     block, trust, parent/child, dedup, trusted-first, cap
//!   → DiscoveryOrchestrator  strict phase, relaxed fallback when empty
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use edu_discovery::{
//!     build_backends, BackendCredentials, BackendSelection, DiscoveryOrchestrator,
//!     DiscoveryRequest, DomainPolicy, ExecutorConfig, SearchExecutor,
//! };
//!
//! let backends = build_backends(&BackendSelection::Auto, &BackendCredentials::new())?;
//! let executor = SearchExecutor::new(backends, ExecutorConfig::default())?;
//! let discovery = DiscoveryOrchestrator::new(DomainPolicy::default(), executor)?;
//!
//! let request = DiscoveryRequest::new(8, "Physics", "Gravity").with_content_types(["practice"]);
//! for result in discovery.search(&request).await? {
//!     println!("{} {}", if result.is_trusted() { "✓" } else { "○" }, result.url());
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`] - Requests, results, grades, policy and tuning values
//! - [`traits`] - The `SearchBackend` abstraction
//! - [`backends`] - Bing, DuckDuckGo, Google Custom Search, Tavily
//! - [`executor`] - Retry/backoff and backend rotation
//! - [`pipeline`] - Resolver, query builder, filter, orchestrator
//! - [`security`] - Credential handling
//! - [`testing`] - Scripted backends for tests

pub mod backends;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use backends::{build_backend, build_backends, BackendKind, BackendSelection};
pub use error::{
    BackendError, BackendFailure, ConfigError, DiscoveryError, FailureKind, SearchError,
};
pub use executor::{classify_failure, looks_like_challenge, SearchExecutor};
pub use pipeline::{
    DiscoveryOrchestrator, DiscoveryReport, DomainResolver, PhaseOutcome, PhaseReport,
    QueryBuilder, ResultFilter,
};
pub use security::{BackendCredentials, GoogleCseCredentials, SecretString};
pub use traits::backend::{BlockingSearchBackend, Offloaded, SearchBackend, SearchQuery};
pub use types::{
    config::{ExecutorConfig, QueryVocabulary, RetryPolicy, RESULT_CAP},
    grade::{Grade, GradeBand},
    policy::DomainPolicy,
    request::DiscoveryRequest,
    result::{RawHit, SearchResult},
};
