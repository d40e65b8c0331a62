//! Google Custom Search JSON API backend.
//!
//! The API returns at most 10 items per call, so larger requests page
//! with `start` until enough items arrive or the response stops
//! advertising a `nextPage`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{check_status, http_client};
use crate::error::{BackendError, BackendResult, ConfigResult};
use crate::security::GoogleCseCredentials;
use crate::traits::backend::{SearchBackend, SearchQuery};
use crate::types::result::RawHit;

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Items per request allowed by the API.
const PAGE_SIZE: usize = 10;

/// The API refuses `start` beyond 91 (100 results total).
const MAX_START: usize = 91;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
    #[serde(default)]
    queries: CseQueries,
}

#[derive(Debug, Default, Deserialize)]
struct CseQueries {
    #[serde(rename = "nextPage", default)]
    next_page: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

/// One parsed page of results.
#[derive(Debug, PartialEq)]
pub struct CsePage {
    pub hits: Vec<RawHit>,
    pub has_next: bool,
}

/// Parse one API response body.
pub fn parse_page(body: &str) -> BackendResult<CsePage> {
    let response: CseResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::Parse(format!("custom search response: {e}")))?;
    Ok(CsePage {
        has_next: !response.queries.next_page.is_empty(),
        hits: response
            .items
            .into_iter()
            .map(|item| {
                RawHit::new(item.link)
                    .with_title(item.title)
                    .with_snippet(item.snippet.split_whitespace().collect::<Vec<_>>().join(" "))
            })
            .collect(),
    })
}

pub struct GoogleCseBackend {
    client: reqwest::Client,
    credentials: GoogleCseCredentials,
    endpoint: String,
}

impl GoogleCseBackend {
    pub fn new(credentials: GoogleCseCredentials) -> ConfigResult<Self> {
        Ok(Self {
            client: http_client(concat!("edu-discovery/", env!("CARGO_PKG_VERSION")))?,
            credentials,
            endpoint: SEARCH_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        start: usize,
        num: usize,
    ) -> BackendResult<CsePage> {
        let mut params = vec![
            ("key", self.credentials.api_key.expose().to_string()),
            ("cx", self.credentials.cx.clone()),
            ("q", query.text.clone()),
            ("num", num.to_string()),
            ("start", start.to_string()),
        ];
        if let Some(country) = query.region.as_deref().and_then(|r| r.split('-').next()) {
            if country.len() == 2 {
                params.push(("gl", country.to_lowercase()));
            }
        }

        // The key travels in the query string; errors must not echo the URL.
        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(BackendError::http_redacted)?;

        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(BackendError::http_redacted)?;
        parse_page(&body)
    }
}

#[async_trait]
impl SearchBackend for GoogleCseBackend {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        let mut hits: Vec<RawHit> = Vec::new();
        let mut start = 1;

        while hits.len() < query.max_results && start <= MAX_START {
            let num = (query.max_results - hits.len()).min(PAGE_SIZE);
            debug!(start, num, "Google custom search page");

            let page = match self.fetch_page(query, start, num).await {
                Ok(page) => page,
                // Keep what earlier pages returned.
                Err(e) if !hits.is_empty() => {
                    warn!(error = %e, collected = hits.len(), "Google pagination stopped early");
                    break;
                }
                Err(e) => return Err(e),
            };

            if page.hits.is_empty() {
                break;
            }
            start += page.hits.len();
            hits.extend(page.hits);

            if !page.has_next {
                break;
            }
        }

        hits.truncate(query.max_results);
        Ok(hits)
    }
}
