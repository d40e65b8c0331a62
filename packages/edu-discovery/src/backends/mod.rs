//! Search backend implementations.
//!
//! - [`BingBackend`] - scraped Bing result pages
//! - [`DuckDuckGoBackend`] - scraped DuckDuckGo HTML endpoint
//! - [`GoogleCseBackend`] - Google Custom Search JSON API
//! - [`TavilyBackend`] - Tavily search API
//!
//! Backends are picked by [`BackendKind`] through a [`BackendSelection`]:
//! every usable provider, one preferred provider backed by the rest, or
//! an exact list.

pub mod bing;
pub mod duckduckgo;
pub mod google;
pub mod tavily;

pub use bing::BingBackend;
pub use duckduckgo::DuckDuckGoBackend;
pub use google::GoogleCseBackend;
pub use tavily::TavilyBackend;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use scraper::Selector;
use tracing::debug;

use crate::error::{BackendError, BackendResult, ConfigError, ConfigResult};
use crate::security::BackendCredentials;
use crate::traits::backend::SearchBackend;

/// Browser-like agent; result pages served to bot agents are stripped down.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Longest response body kept in a status error.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Bing,
    DuckDuckGo,
    GoogleCse,
    Tavily,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::DuckDuckGo,
        BackendKind::Bing,
        BackendKind::GoogleCse,
        BackendKind::Tavily,
    ];

    /// Name used in logs, on the command line and for preference matching.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Bing => "bing",
            BackendKind::DuckDuckGo => "duckduckgo",
            BackendKind::GoogleCse => "google",
            BackendKind::Tavily => "tavily",
        }
    }

    pub fn needs_credentials(&self) -> bool {
        matches!(self, BackendKind::GoogleCse | BackendKind::Tavily)
    }

    fn is_configured(&self, creds: &BackendCredentials) -> bool {
        match self {
            BackendKind::Bing | BackendKind::DuckDuckGo => true,
            BackendKind::GoogleCse => creds.google.is_some(),
            BackendKind::Tavily => creds.tavily_api_key.is_some(),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bing" => Ok(BackendKind::Bing),
            "duckduckgo" | "ddg" => Ok(BackendKind::DuckDuckGo),
            "google" | "google_cse" | "google-cse" => Ok(BackendKind::GoogleCse),
            "tavily" => Ok(BackendKind::Tavily),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Which backends to run, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendSelection {
    /// Every usable backend: DuckDuckGo, Bing, then Google and Tavily
    /// when their credentials exist
    #[default]
    Auto,
    /// This backend first, then the `Auto` list as failure fallbacks;
    /// missing credentials for it are an error
    Preferred(BackendKind),
    /// Exactly these, in this order; missing credentials are an error
    Explicit(Vec<BackendKind>),
}

impl BackendSelection {
    /// Parse `auto`, one backend name (preferred, with fallbacks) or a
    /// comma separated list (exactly those backends).
    pub fn parse(value: &str) -> ConfigResult<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("auto") {
            return Ok(BackendSelection::Auto);
        }
        let kinds = value
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(BackendKind::from_str)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(BackendSelection::from_kinds(kinds))
    }

    pub fn from_kinds(kinds: Vec<BackendKind>) -> Self {
        let mut unique = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        match unique.as_slice() {
            [] => BackendSelection::Auto,
            [only] => BackendSelection::Preferred(*only),
            _ => BackendSelection::Explicit(unique),
        }
    }

    /// Backend to try first, when the selection names a single one.
    pub fn preferred(&self) -> Option<BackendKind> {
        match self {
            BackendSelection::Preferred(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Resolve to concrete kinds for the given credentials.
    pub fn kinds(&self, creds: &BackendCredentials) -> ConfigResult<Vec<BackendKind>> {
        match self {
            BackendSelection::Auto => Ok(BackendKind::ALL
                .into_iter()
                .filter(|k| k.is_configured(creds))
                .collect()),
            BackendSelection::Preferred(first) => {
                if !first.is_configured(creds) {
                    return Err(missing_credential(*first));
                }
                let mut kinds = vec![*first];
                kinds.extend(
                    BackendKind::ALL
                        .into_iter()
                        .filter(|k| k != first && k.is_configured(creds)),
                );
                Ok(kinds)
            }
            BackendSelection::Explicit(kinds) => {
                if let Some(missing) = kinds.iter().find(|k| !k.is_configured(creds)) {
                    return Err(missing_credential(*missing));
                }
                Ok(kinds.clone())
            }
        }
    }
}

fn missing_credential(kind: BackendKind) -> ConfigError {
    let name = match kind {
        BackendKind::GoogleCse => "GOOGLE_SEARCH_API_KEY / GOOGLE_SEARCH_CX",
        BackendKind::Tavily => "TAVILY_API_KEY",
        BackendKind::Bing | BackendKind::DuckDuckGo => "none",
    };
    ConfigError::MissingCredential {
        backend: kind.name(),
        name,
    }
}

/// Build one backend.
pub fn build_backend(
    kind: BackendKind,
    creds: &BackendCredentials,
) -> ConfigResult<Arc<dyn SearchBackend>> {
    let backend: Arc<dyn SearchBackend> = match kind {
        BackendKind::Bing => Arc::new(BingBackend::new()?),
        BackendKind::DuckDuckGo => Arc::new(DuckDuckGoBackend::new()?),
        BackendKind::GoogleCse => {
            let google = creds.google.clone().ok_or_else(|| missing_credential(kind))?;
            Arc::new(GoogleCseBackend::new(google)?)
        }
        BackendKind::Tavily => {
            let key = creds
                .tavily_api_key
                .clone()
                .ok_or_else(|| missing_credential(kind))?;
            Arc::new(TavilyBackend::new(key)?)
        }
    };
    Ok(backend)
}

/// Build the backends a selection resolves to, in priority order.
pub fn build_backends(
    selection: &BackendSelection,
    creds: &BackendCredentials,
) -> ConfigResult<Vec<Arc<dyn SearchBackend>>> {
    let kinds = selection.kinds(creds)?;
    if kinds.is_empty() {
        return Err(ConfigError::NoBackends);
    }
    debug!(backends = ?kinds, "Building search backends");
    kinds.into_iter().map(|k| build_backend(k, creds)).collect()
}

/// HTTP client shared by the backends' constructors.
pub(crate) fn http_client(user_agent: &str) -> ConfigResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ConfigError::HttpClient(Box::new(e)))
}

/// Turn a non-success response into a `BackendError::Status`.
pub(crate) async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() && status != reqwest::StatusCode::ACCEPTED {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body: truncate(&body, ERROR_BODY_LIMIT),
    })
}

pub(crate) fn selector(css: &str) -> BackendResult<Selector> {
    Selector::parse(css).map_err(|e| BackendError::Parse(format!("bad selector {css:?}: {e}")))
}

/// Collapse runs of whitespace in scraped text.
pub(crate) fn clean_text<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
