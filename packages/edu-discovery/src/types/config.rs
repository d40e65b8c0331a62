//! Configuration types for query building and search execution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::grade::GradeBand;

/// Results returned by one discovery call, whatever `max_results` says.
pub const RESULT_CAP: usize = 15;

/// Keyword hints taken per content-type tag.
pub const KEYWORDS_PER_CONTENT_TYPE: usize = 2;

/// Static vocabulary used by the query builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryVocabulary {
    /// Content-type tag → keywords, most important first
    pub content_keywords: IndexMap<String, Vec<String>>,

    /// Negated terms that keep a band's results age-appropriate
    pub grade_exclusions: IndexMap<GradeBand, String>,
}

impl Default for QueryVocabulary {
    fn default() -> Self {
        let keywords: &[(&str, &[&str])] = &[
            (
                "concept_explainer",
                &["tutorial", "lesson", "explained", "introduction"],
            ),
            (
                "reasoning",
                &["derivation", "proof", "worked-example", "step-by-step"],
            ),
            (
                "material_visual",
                &["flowchart", "diagram", "infographic", "chart"],
            ),
            ("material_equation", &["equation", "formula", "calculation"]),
            (
                "practice",
                &["worksheet", "exercise", "quiz", "practice-problems"],
            ),
            ("video", &["video", "lecture"]),
            ("simulation", &["simulation", "interactive", "virtual-lab"]),
            ("printable", &["filetype:pdf", "worksheet", "printable"]),
        ];

        let mut grade_exclusions = IndexMap::new();
        grade_exclusions.insert(
            GradeBand::Primary,
            r#"-college -university -"high school" -"AP " -calculus -thesis"#.to_string(),
        );
        grade_exclusions.insert(
            GradeBand::Middle,
            r#"-college -university -"AP " -thesis -doctoral"#.to_string(),
        );
        grade_exclusions.insert(
            GradeBand::High,
            r#"-"elementary school" -kindergarten -"grade 3" -"grade 2""#.to_string(),
        );

        Self {
            content_keywords: keywords
                .iter()
                .map(|(tag, words)| {
                    (
                        tag.to_string(),
                        words.iter().map(|w| w.to_string()).collect(),
                    )
                })
                .collect(),
            grade_exclusions,
        }
    }
}

impl QueryVocabulary {
    /// Known content-type tags, in declaration order.
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.content_keywords.keys().map(String::as_str)
    }
}

/// Retry behaviour for rate-limited backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per backend, first try included
    pub max_attempts: u32,

    /// Delay before the first retry; doubles each attempt
    pub base_delay: Duration,

    /// Upper bound of the random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// No jitter; handy for deterministic tests.
    pub fn without_jitter(self) -> Self {
        self.with_max_jitter(Duration::ZERO)
    }

    /// Delay without jitter after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Delay including jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..=jitter_ms))
        };
        self.backoff(attempt) + jitter
    }
}

/// Settings for the search executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub retry: RetryPolicy,

    /// Deadline for a single backend attempt
    pub call_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}
