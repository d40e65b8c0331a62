//! Domain resolution.
//!
//! Turns a grade and subject into the ordered list of trusted domains
//! used for the site filter and for trust classification.

use indexmap::IndexSet;
use std::sync::Arc;
use tracing::debug;

use crate::types::grade::Grade;
use crate::types::policy::{DomainPolicy, REFERENCE_SUBJECT};

#[derive(Debug, Clone)]
pub struct DomainResolver {
    policy: Arc<DomainPolicy>,
}

impl DomainResolver {
    pub fn new(policy: Arc<DomainPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Core domains, then the first matching subject's domains, then the
    /// band's reference list, then `extra_domains`. Duplicates keep their
    /// first position.
    pub fn resolve(&self, grade: &Grade, subject: &str, extra_domains: &[String]) -> Vec<String> {
        let band = grade.band();
        let mut domains: IndexSet<String> = self.policy.core_domains.iter().cloned().collect();

        let subjects = self.policy.subjects_for(band);

        match subjects.and_then(|map| match_subject(map.iter(), subject)) {
            Some((key, matched)) => {
                debug!(subject, key, %band, "Matched subject domains");
                domains.extend(matched.iter().cloned());
            }
            None => {
                debug!(subject, %band, "No subject-specific domains; using core domains only");
            }
        }

        if let Some(reference) = subjects.and_then(|map| map.get(REFERENCE_SUBJECT)) {
            domains.extend(reference.iter().cloned());
        }

        domains.extend(
            extra_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty()),
        );

        debug!(count = domains.len(), %grade, subject, "Resolved domains");
        domains.into_iter().collect()
    }
}

/// First subject key where either side contains the other, ignoring case.
/// The underscore form of the subject is tried too, so "Social Studies"
/// reaches `social_studies`.
fn match_subject<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Vec<String>)>,
    subject: &str,
) -> Option<(&'a str, &'a [String])> {
    let plain = subject.trim().to_lowercase();
    if plain.is_empty() {
        return None;
    }
    let underscored = plain.split_whitespace().collect::<Vec<_>>().join("_");

    entries
        .filter(|(key, _)| key.as_str() != REFERENCE_SUBJECT)
        .find(|(key, _)| {
            let key = key.to_lowercase();
            [&plain, &underscored]
                .iter()
                .any(|s| key.contains(s.as_str()) || s.contains(key.as_str()))
        })
        .map(|(key, domains)| (key.as_str(), domains.as_slice()))
}
