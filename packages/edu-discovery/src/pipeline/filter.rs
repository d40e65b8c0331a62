//! Result filtering and ranking.
//!
//! Raw hits go through, in order: normalization, block/exclusion
//! rejection, trust classification (strict mode drops untrusted hits),
//! parent/child reduction, exact dedup, trusted-first stable sort and
//! the result cap.
//!
//! Parent/child reduction compares every pair of candidates. Backends
//! return at most a few dozen hits per query, so the quadratic pass
//! stays cheap; it is not meant for large candidate sets.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::types::config::RESULT_CAP;
use crate::types::policy::DomainPolicy;
use crate::types::result::{RawHit, SearchResult};

/// A hit that survived normalization and blocking.
#[derive(Debug)]
struct Candidate<'a> {
    hit: &'a RawHit,
    norm_url: &'a str,
    domain: String,
    is_trusted: bool,
}

#[derive(Debug, Clone)]
pub struct ResultFilter {
    policy: Arc<DomainPolicy>,
    cap: usize,
}

impl ResultFilter {
    pub fn new(policy: Arc<DomainPolicy>) -> Self {
        Self {
            policy,
            cap: RESULT_CAP,
        }
    }

    /// Filter, rank and cap raw hits.
    ///
    /// `trusted` is the resolved domain list; `blocked` adds to the
    /// policy's block patterns for this call only.
    pub fn filter(
        &self,
        raw: &[RawHit],
        trusted: &[String],
        blocked: &[String],
        strict: bool,
    ) -> Vec<SearchResult> {
        let blocks = self.block_patterns(blocked);
        let trusted: Vec<String> = trusted
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let mut candidates = Vec::with_capacity(raw.len());
        for hit in raw {
            let Some((norm_url, domain, path)) = normalize(&hit.url) else {
                continue;
            };

            let url_lower = hit.url.to_lowercase();
            if let Some(pattern) = blocks
                .iter()
                .find(|b| domain.contains(b.as_str()) || url_lower.contains(b.as_str()))
            {
                debug!(url = %hit.url, pattern = %pattern, "Blocked");
                continue;
            }
            if self.is_excluded_path(&path) {
                debug!(url = %hit.url, "Excluded path");
                continue;
            }

            let is_trusted = trusted.iter().any(|t| domain.contains(t.as_str()));
            if strict && !is_trusted {
                continue;
            }

            candidates.push(Candidate {
                hit,
                norm_url,
                domain,
                is_trusted,
            });
        }

        let survivors = drop_parents(candidates);

        let mut seen = HashSet::new();
        let mut output: Vec<SearchResult> = survivors
            .into_iter()
            .filter(|c| seen.insert(c.norm_url))
            .map(|c| SearchResult::from_hit(c.hit, c.domain, c.is_trusted))
            .collect();

        // `sort_by_key` is stable, so each group keeps its input order.
        output.sort_by_key(|r| !r.is_trusted());
        output.truncate(self.cap);

        info!(
            raw = raw.len(),
            kept = output.len(),
            trusted = output.iter().filter(|r| r.is_trusted()).count(),
            strict,
            "Filtered results"
        );
        output
    }

    fn block_patterns(&self, extra: &[String]) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();
        for pattern in self.policy.block_patterns.iter().chain(extra) {
            let pattern = pattern.trim().to_lowercase();
            if !pattern.is_empty() && !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
        patterns
    }

    fn is_excluded_path(&self, path: &str) -> bool {
        self.policy
            .excluded_paths
            .iter()
            .any(|fragment| path.contains(&fragment.to_lowercase()))
    }
}

/// Split a raw URL into (comparison URL, domain, lower-cased path).
///
/// The comparison URL is the original text cut at the first `?` or `#`.
/// Returns `None` for empty, unparseable or host-less URLs.
fn normalize(raw: &str) -> Option<(&str, String, String)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();
    let norm_url = raw.split(['?', '#']).next().unwrap_or(raw);
    Some((norm_url, domain, parsed.path().to_lowercase()))
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Drop every candidate whose URL is a strict path prefix of another's.
fn drop_parents(candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    let keys: Vec<String> = candidates
        .iter()
        .map(|c| with_trailing_slash(c.norm_url))
        .collect();

    candidates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            let parent = &keys[*i];
            let is_parent = keys
                .iter()
                .enumerate()
                .any(|(j, child)| j != *i && child.len() > parent.len() && child.starts_with(parent.as_str()));
            !is_parent
        })
        .map(|(_, c)| c)
        .collect()
}
