//! Discovery request.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::grade::Grade;

/// Default number of hits requested from a backend.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// What the caller wants sources for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub grade: Grade,
    pub subject: String,
    pub topic: String,
    pub subtopic: Option<String>,

    /// Content-type tags (e.g. "practice", "video") mapped to keyword hints
    #[serde(default)]
    pub content_types: Vec<String>,

    /// Trusted domains added on top of the policy for this request
    #[serde(default)]
    pub extra_domains: Vec<String>,

    /// Blocked domains added on top of the policy for this request
    #[serde(default)]
    pub blocked_domains: Vec<String>,

    /// Upper bound on hits fetched per backend call. Does not change
    /// the final result cap.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Drop results outside the trusted set instead of ranking them lower
    #[serde(default)]
    pub strict: bool,

    /// Region hint passed through to backends that support one
    pub region: Option<String>,

    /// Backend to try first, by name
    pub preferred_backend: Option<String>,
}

impl DiscoveryRequest {
    pub fn new(
        grade: impl Into<Grade>,
        subject: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            grade: grade.into(),
            subject: subject.into(),
            topic: topic.into(),
            subtopic: None,
            content_types: vec![],
            extra_domains: vec![],
            blocked_domains: vec![],
            max_results: DEFAULT_MAX_RESULTS,
            strict: false,
            region: None,
            preferred_backend: None,
        }
    }

    pub fn with_subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = Some(subtopic.into());
        self
    }

    pub fn with_content_types(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.content_types = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra_domains(mut self, domains: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_blocked_domains(
        mut self,
        domains: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.blocked_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_preferred_backend(mut self, name: impl Into<String>) -> Self {
        self.preferred_backend = Some(name.into());
        self
    }

    /// Subtopic if present and not blank.
    pub fn subtopic(&self) -> Option<&str> {
        self.subtopic.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Reject requests that cannot produce a meaningful query.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_results == 0 {
            return Err(invalid("max_results must be positive"));
        }
        if self.subject.trim().is_empty() {
            return Err(invalid("subject must not be empty"));
        }
        if self.topic.trim().is_empty() {
            return Err(invalid("topic must not be empty"));
        }
        if let Some(d) = self
            .extra_domains
            .iter()
            .find(|d| d.trim().is_empty() || d.contains(char::is_whitespace))
        {
            return Err(invalid(format!("extra domain {d:?} is not a host name")));
        }
        Ok(())
    }
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidRequest {
        reason: reason.into(),
    }
}
