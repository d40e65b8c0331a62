//! Tavily-backed search.
//!
//! Tavily understands `site:` operators inside the query text, so the
//! site filter needs no translation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, http_client};
use crate::error::{BackendError, BackendResult, ConfigResult};
use crate::security::SecretString;
use crate::traits::backend::{SearchBackend, SearchQuery};
use crate::types::result::RawHit;

const SEARCH_URL: &str = "https://api.tavily.com/search";

/// Largest `max_results` the API accepts.
const MAX_RESULTS: usize = 20;

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Parse a Tavily response body.
pub fn parse_response(body: &str) -> BackendResult<Vec<RawHit>> {
    let response: TavilyResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::Parse(format!("tavily response: {e}")))?;
    Ok(response
        .results
        .into_iter()
        .map(|r| {
            RawHit::new(r.url)
                .with_title(r.title.unwrap_or_default())
                .with_snippet(r.content.unwrap_or_default())
        })
        .collect())
}

pub struct TavilyBackend {
    client: reqwest::Client,
    api_key: SecretString,
    search_depth: String,
    endpoint: String,
}

impl TavilyBackend {
    pub fn new(api_key: SecretString) -> ConfigResult<Self> {
        Ok(Self {
            client: http_client(concat!("edu-discovery/", env!("CARGO_PKG_VERSION")))?,
            api_key,
            search_depth: "basic".to_string(),
            endpoint: SEARCH_URL.to_string(),
        })
    }

    /// Set search depth ("basic" or "advanced").
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        let request = TavilyRequest {
            query: &query.text,
            search_depth: &self.search_depth,
            max_results: query.max_results.clamp(1, MAX_RESULTS),
        };
        debug!(query = %query.text, max_results = request.max_results, "Tavily search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(BackendError::http)?;

        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(BackendError::http)?;

        let mut hits = parse_response(&body)?;
        hits.truncate(query.max_results);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "query": "gravity",
            "results": [
                {"url": "https://ck12.org/gravity", "title": "Gravity", "content": "All about gravity", "score": 0.91},
                {"url": "https://openstax.org/physics", "title": null}
            ]
        }"#;
        let hits = parse_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "All about gravity");
        assert_eq!(hits[1].title, "");
    }

    #[test]
    fn test_parse_response_without_results_is_empty() {
        assert!(parse_response(r#"{"query": "x"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_request_body_shape() {
        let request = TavilyRequest {
            query: "\"Grade 8\" \"Physics\"",
            search_depth: "basic",
            max_results: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["search_depth"], "basic");
        assert_eq!(json["max_results"], 10);
    }
}
