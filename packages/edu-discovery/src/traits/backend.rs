//! Search backend trait.
//!
//! Every provider (scraped result pages, search APIs, synchronous
//! client libraries) is one `SearchBackend`. The executor only sees
//! this trait, so providers can be swapped or reordered by
//! configuration without touching the pipeline.
//!
//! ```rust,ignore
//! let backend = DuckDuckGoBackend::new()?;
//! let hits = backend.search(&SearchQuery::new("\"Grade 8\" \"Physics\"", 10)).await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{BackendError, BackendResult};
use crate::types::result::RawHit;

/// A fully built query plus per-call hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub max_results: usize,
    /// Region/market hint such as "us-en". Backends may ignore it.
    pub region: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, max_results: usize) -> Self {
        Self {
            text: text.into(),
            max_results,
            region: None,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

/// A search-results provider.
///
/// Implementations return `Ok(vec![])` only when the provider answered
/// and had nothing. Refusals (rate limits, captcha pages) and transport
/// problems must come back as errors so the executor can retry or move
/// on.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Stable short name used in logs and for explicit selection.
    fn name(&self) -> &'static str;

    /// Run one query.
    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>>;
}

#[async_trait]
impl<B: SearchBackend + ?Sized> SearchBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        (**self).search(query).await
    }
}

/// A provider whose client blocks the calling thread.
pub trait BlockingSearchBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn search_blocking(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>>;
}

/// Runs a `BlockingSearchBackend` on tokio's blocking pool so it never
/// stalls the reactor other discovery calls are using.
pub struct Offloaded<B: BlockingSearchBackend> {
    inner: Arc<B>,
}

impl<B: BlockingSearchBackend> Offloaded<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }
}

#[async_trait]
impl<B: BlockingSearchBackend> SearchBackend for Offloaded<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        let inner = Arc::clone(&self.inner);
        let query = query.clone();
        tokio::task::spawn_blocking(move || inner.search_blocking(&query))
            .await
            .map_err(|e| BackendError::Worker(e.to_string()))?
    }
}
