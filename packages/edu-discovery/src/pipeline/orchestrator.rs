//! Discovery orchestration.
//!
//! One call runs at most two phases:
//!
//! 1. **Strict**: query with a site filter over the resolved domains.
//! 2. **Relaxed**: only if strict produced nothing; same query without
//!    the site filter, filtered against the same trusted set with the
//!    same strict flag.
//!
//! Search failures inside a phase are logged and count as an empty
//! phase. Only configuration problems, found before any network call,
//! are returned as errors.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ConfigResult, Result};
use crate::executor::SearchExecutor;
use crate::pipeline::filter::ResultFilter;
use crate::pipeline::query::{QueryBuilder, QueryParts};
use crate::pipeline::resolve::DomainResolver;
use crate::traits::backend::SearchQuery;
use crate::types::config::QueryVocabulary;
use crate::types::policy::DomainPolicy;
use crate::types::request::DiscoveryRequest;
use crate::types::result::SearchResult;

/// How one phase ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Results survived filtering
    Found { count: usize },
    /// A backend answered but nothing survived filtering
    Empty,
    /// Every backend failed; `blocked` is set when one refused us
    Failed { reason: String, blocked: bool },
}

impl PhaseOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseOutcome::Failed { .. })
    }
}

impl fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseOutcome::Found { count } => write!(f, "found {}", count),
            PhaseOutcome::Empty => f.write_str("empty"),
            PhaseOutcome::Failed { reason, blocked: true } => write!(f, "blocked: {}", reason),
            PhaseOutcome::Failed { reason, .. } => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub query: String,
    /// Hits the backend returned before filtering
    pub raw_hits: usize,
    pub outcome: PhaseOutcome,
}

/// Results of one discovery call plus what happened along the way.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub run_id: Uuid,
    pub domains: Vec<String>,
    pub strict: PhaseReport,
    /// Present only when the strict phase came back empty
    pub relaxed: Option<PhaseReport>,
    pub results: Vec<SearchResult>,
}

impl DiscoveryReport {
    /// True when at least one phase failed instead of finding nothing.
    pub fn had_failures(&self) -> bool {
        self.strict.outcome.is_failed()
            || self.relaxed.as_ref().is_some_and(|r| r.outcome.is_failed())
    }
}

pub struct DiscoveryOrchestrator {
    resolver: DomainResolver,
    queries: QueryBuilder,
    executor: SearchExecutor,
    filter: ResultFilter,
}

impl DiscoveryOrchestrator {
    /// Validate the policy and wire the pipeline around it.
    pub fn new(policy: DomainPolicy, executor: SearchExecutor) -> ConfigResult<Self> {
        Self::with_shared_policy(Arc::new(policy), executor)
    }

    pub fn with_shared_policy(policy: Arc<DomainPolicy>, executor: SearchExecutor) -> ConfigResult<Self> {
        policy.validate()?;
        Ok(Self {
            resolver: DomainResolver::new(Arc::clone(&policy)),
            queries: QueryBuilder::default(),
            filter: ResultFilter::new(policy),
            executor,
        })
    }

    pub fn with_vocabulary(mut self, vocabulary: QueryVocabulary) -> Self {
        self.queries = QueryBuilder::new(vocabulary);
        self
    }

    pub fn policy(&self) -> &DomainPolicy {
        self.resolver.policy()
    }

    pub fn executor(&self) -> &SearchExecutor {
        &self.executor
    }

    /// Discover sources for `request`.
    ///
    /// An empty list is a normal answer. Errors are configuration
    /// problems only.
    pub async fn search(&self, request: &DiscoveryRequest) -> Result<Vec<SearchResult>> {
        Ok(self.search_detailed(request).await?.results)
    }

    /// Like `search`, also reporting how each phase ended.
    pub async fn search_detailed(&self, request: &DiscoveryRequest) -> Result<DiscoveryReport> {
        request.validate()?;
        if let Some(name) = &request.preferred_backend {
            self.executor.check_backend(name)?;
        }
        Ok(self.run(request, Uuid::new_v4()).await)
    }

    #[instrument(
        name = "discovery",
        skip(self, request),
        fields(run_id = %run_id, grade = %request.grade, subject = %request.subject, topic = %request.topic)
    )]
    async fn run(&self, request: &DiscoveryRequest, run_id: Uuid) -> DiscoveryReport {
        info!(
            subtopic = request.subtopic().unwrap_or(""),
            strict = request.strict,
            "Starting discovery"
        );

        let domains = self
            .resolver
            .resolve(&request.grade, &request.subject, &request.extra_domains);
        let parts = QueryParts {
            grade: &request.grade,
            subject: &request.subject,
            topic: &request.topic,
            subtopic: request.subtopic(),
            content_types: &request.content_types,
        };

        let strict_query = self.queries.build(&parts, Some(&domains));
        let (results, strict) = self.phase("strict", strict_query, request, &domains).await;
        if !results.is_empty() {
            return DiscoveryReport {
                run_id,
                domains,
                strict,
                relaxed: None,
                results,
            };
        }

        info!("No results from strict search; retrying without site filters");
        let relaxed_query = self.queries.build(&parts, None);
        let (results, relaxed) = self.phase("relaxed", relaxed_query, request, &domains).await;

        match &relaxed.outcome {
            PhaseOutcome::Found { count } => info!(count, "Fallback search found results"),
            PhaseOutcome::Empty => warn!("Fallback search returned no results"),
            PhaseOutcome::Failed { .. } => {}
        }

        DiscoveryReport {
            run_id,
            domains,
            strict,
            relaxed: Some(relaxed),
            results,
        }
    }

    async fn phase(
        &self,
        phase: &'static str,
        query_text: String,
        request: &DiscoveryRequest,
        domains: &[String],
    ) -> (Vec<SearchResult>, PhaseReport) {
        let query = SearchQuery::new(query_text, request.max_results).with_region(request.region.clone());

        let raw = match self
            .executor
            .fetch_preferring(&query, request.preferred_backend.as_deref())
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                let blocked = err.was_blocked();
                if blocked {
                    warn!(phase, error = %err, "Search was blocked; treating as no results");
                } else {
                    warn!(phase, error = %err, "Search failed; treating as no results");
                }
                let report = PhaseReport {
                    query: query.text,
                    raw_hits: 0,
                    outcome: PhaseOutcome::Failed {
                        reason: err.to_string(),
                        blocked,
                    },
                };
                return (vec![], report);
            }
        };

        let results = self
            .filter
            .filter(&raw, domains, &request.blocked_domains, request.strict);

        let outcome = if results.is_empty() {
            info!(phase, raw_hits = raw.len(), "Search succeeded with no usable results");
            PhaseOutcome::Empty
        } else {
            PhaseOutcome::Found {
                count: results.len(),
            }
        };

        let report = PhaseReport {
            query: query.text,
            raw_hits: raw.len(),
            outcome,
        };
        (results, report)
    }
}
