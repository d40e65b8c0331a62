//! Raw backend hits and filtered search results.

use serde::{Deserialize, Serialize};

/// One hit exactly as a backend returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

impl RawHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

/// A discovered, filtered, trust-annotated source.
///
/// Only `ResultFilter` constructs these, so fields are read through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    title: String,
    url: String,
    snippet: String,
    domain: String,
    is_trusted: bool,
}

impl SearchResult {
    pub(crate) fn from_hit(hit: &RawHit, domain: String, is_trusted: bool) -> Self {
        Self {
            title: hit.title.clone(),
            url: hit.url.clone(),
            snippet: hit.snippet.clone(),
            domain,
            is_trusted,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Original URL, query string included.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Lower-cased host without a leading `www.`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_trusted(&self) -> bool {
        self.is_trusted
    }
}
