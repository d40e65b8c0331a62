//! Trusted and blocked domain policy.
//!
//! A `DomainPolicy` is built once at start-up (defaults, a JSON file, or
//! either plus environment overrides supplied by the caller) and then
//! shared read-only behind an `Arc`. Nothing in the pipeline mutates it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::types::grade::GradeBand;

/// Pseudo-subject whose domains are appended for every subject in a band.
pub const REFERENCE_SUBJECT: &str = "reference";

/// Subject → domains, scanned in insertion order.
pub type SubjectDomains = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainPolicy {
    /// Always trusted, whatever the grade or subject
    pub core_domains: Vec<String>,

    /// Band → subject → trusted domains
    pub band_domains: IndexMap<GradeBand, SubjectDomains>,

    /// Substrings that reject a hit when found in its host or URL
    pub block_patterns: Vec<String>,

    /// Path fragments that mark non-content pages (login walls, shops)
    pub excluded_paths: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            core_domains: strings(&[
                "khanacademy.org",
                "ck12.org",
                "education.com",
                "pbslearningmedia.org",
                "byjus.com",
                "openstax.org",
                "brilliant.org",
                "britannica.com",
            ]),
            band_domains: default_band_domains(),
            block_patterns: strings(&[
                "bing.com",
                "google.com",
                "googleadservices.com",
                "encrypted",
                "gstatic.com",
                "microsoft.com",
                "youtube.com",
                "facebook.com",
                "twitter.com",
                "instagram.com",
            ]),
            excluded_paths: strings(&[
                "/login",
                "/signup",
                "/pricing",
                "/cart",
                "/checkout",
                "/subscribe",
                "/premium",
                "/app-download",
                "/trial",
            ]),
        }
    }
}

fn default_band_domains() -> IndexMap<GradeBand, SubjectDomains> {
    fn band(entries: &[(&str, &[&str])]) -> SubjectDomains {
        entries
            .iter()
            .map(|(subject, domains)| (subject.to_string(), strings(domains)))
            .collect()
    }

    let mut map = IndexMap::new();
    map.insert(
        GradeBand::Primary,
        band(&[
            ("math", &["abcya.com", "coolmath4kids.com", "mathseeds.com"]),
            ("science", &["kids.nationalgeographic.com", "sciencebob.com"]),
            ("social_studies", &["ducksters.com", "pbskids.org"]),
            (
                "language_arts",
                &["starfall.com", "readworks.org", "storylineonline.net"],
            ),
            (
                REFERENCE_SUBJECT,
                &["kids.britannica.com", "ducksters.com", "infoplease.com"],
            ),
        ]),
    );
    map.insert(
        GradeBand::Middle,
        band(&[
            ("math", &["ixl.com", "mathway.com", "desmos.com"]),
            ("science", &["byjus.com", "ck12.org"]),
            (REFERENCE_SUBJECT, &["kids.britannica.com", "infoplease.com"]),
        ]),
    );
    map.insert(
        GradeBand::High,
        band(&[
            ("math", &["desmos.com", "brilliant.org"]),
            ("science", &["biointeractive.org", "labxchange.org", "ck12.org"]),
            ("history", &["crashcourse.com", "bighistoryproject.com"]),
            (
                REFERENCE_SUBJECT,
                &["scholarpedia.org", "citizendium.org", "openstax.org"],
            ),
        ]),
    );
    map
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl DomainPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy with no domains or patterns at all.
    pub fn empty() -> Self {
        Self {
            core_domains: vec![],
            band_domains: IndexMap::new(),
            block_patterns: vec![],
            excluded_paths: vec![],
        }
    }

    /// Parse a policy from JSON. Missing sections fall back to the defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load and validate a JSON policy file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Append trusted domains to the core list.
    pub fn with_trusted_overrides(
        mut self,
        domains: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.core_domains
            .extend(domains.into_iter().map(|d| d.into().trim().to_lowercase()));
        self
    }

    /// Append block patterns.
    pub fn with_blocked_overrides(
        mut self,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.block_patterns
            .extend(patterns.into_iter().map(|p| p.into().trim().to_lowercase()));
        self
    }

    /// Subject map for a band, if the policy has one.
    pub fn subjects_for(&self, band: GradeBand) -> Option<&SubjectDomains> {
        self.band_domains.get(&band)
    }

    /// Check that every entry is usable. Run before any network call.
    pub fn validate(&self) -> ConfigResult<()> {
        for domain in &self.core_domains {
            check_domain("core_domains", domain)?;
        }

        for (band, subjects) in &self.band_domains {
            for (subject, domains) in subjects {
                if subject.trim().is_empty() {
                    return Err(invalid(format!("band {band} has an empty subject key")));
                }
                for domain in domains {
                    check_domain(&format!("band_domains[{band}][{subject}]"), domain)?;
                }
            }
        }

        if self.block_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("block_patterns contains an empty pattern"));
        }

        if let Some(p) = self.excluded_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid(format!("excluded path {p:?} must start with '/'")));
        }

        Ok(())
    }
}

fn check_domain(section: &str, domain: &str) -> ConfigResult<()> {
    let bad = domain.trim().is_empty()
        || domain.contains(char::is_whitespace)
        || domain.contains('/')
        || domain.contains(':');
    if bad {
        return Err(invalid(format!("{section}: {domain:?} is not a host name")));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidPolicy {
        reason: reason.into(),
    }
}
