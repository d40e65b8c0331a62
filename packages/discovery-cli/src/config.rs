use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use edu_discovery::{BackendCredentials, BackendSelection, DomainPolicy};

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub trusted_domains: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub method: BackendSelection,
    pub credentials: BackendCredentials,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let method = match lookup("DISCOVERY_METHOD") {
            Some(value) => BackendSelection::parse(&value)
                .context("DISCOVERY_METHOD must be `auto` or backend names")?,
            None => BackendSelection::Auto,
        };

        let timeout = lookup("DISCOVERY_TIMEOUT_SECS")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .context("DISCOVERY_TIMEOUT_SECS must be a whole number of seconds")?
            .map(Duration::from_secs);

        let mut credentials = BackendCredentials::new();
        if let (Some(key), Some(cx)) = (
            lookup("GOOGLE_SEARCH_API_KEY"),
            lookup("GOOGLE_SEARCH_CX"),
        ) {
            credentials = credentials.with_google(key, cx);
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            credentials = credentials.with_tavily(key);
        }

        Ok(Self {
            trusted_domains: comma_list(lookup("TRUSTED_DOMAINS")),
            blocked_domains: comma_list(lookup("BLOCKED_DOMAINS")),
            method,
            credentials,
            timeout,
        })
    }

    /// Built-in or file policy with the environment overrides applied.
    pub fn policy(&self, file: Option<&Path>) -> Result<DomainPolicy> {
        let base = match file {
            Some(path) => DomainPolicy::from_path(path)
                .with_context(|| format!("Failed to load policy file {}", path.display()))?,
            None => DomainPolicy::default(),
        };
        let policy = base
            .with_trusted_overrides(self.trusted_domains.iter().cloned())
            .with_blocked_overrides(self.blocked_domains.iter().cloned());
        policy
            .validate()
            .context("TRUSTED_DOMAINS / BLOCKED_DOMAINS produced an invalid policy")?;
        Ok(policy)
    }
}

fn comma_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
