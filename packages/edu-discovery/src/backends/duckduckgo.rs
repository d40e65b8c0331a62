//! DuckDuckGo HTML-endpoint backend.
//!
//! The `html.duckduckgo.com` endpoint serves plain result pages without
//! JavaScript. Result links go through a `/l/?uddg=<target>` redirect,
//! which is unwrapped here. When throttling, DuckDuckGo answers 202 with
//! an anomaly page instead of results.

use async_trait::async_trait;
use scraper::Html;
use tracing::debug;
use url::Url;

use super::{check_status, clean_text, http_client, selector, BROWSER_USER_AGENT};
use crate::error::{BackendError, BackendResult, ConfigResult};
use crate::executor::looks_like_challenge;
use crate::traits::backend::{SearchBackend, SearchQuery};
use crate::types::result::RawHit;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Region used when the query carries none.
pub const DEFAULT_REGION: &str = "us-en";

pub struct DuckDuckGoBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoBackend {
    pub fn new() -> ConfigResult<Self> {
        Ok(Self {
            client: http_client(BROWSER_USER_AGENT)?,
            endpoint: SEARCH_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Scrape organic results from a DuckDuckGo HTML page. Ads are skipped.
pub fn parse_results(html: &str, limit: usize) -> BackendResult<Vec<RawHit>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result, .web-result")?;
    let title_sel = selector(".result__title a, a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits: Vec<RawHit> = Vec::new();
    for item in document.select(&result_sel) {
        if item.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = item.select(&title_sel).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(resolve_link) else {
            continue;
        };
        if hits.iter().any(|h| h.url == url) {
            continue;
        }
        let snippet = item
            .select(&snippet_sel)
            .next()
            .map(|s| clean_text(s.text()))
            .unwrap_or_default();

        hits.push(
            RawHit::new(url)
                .with_title(clean_text(link.text()))
                .with_snippet(snippet),
        );
        if hits.len() >= limit {
            break;
        }
    }

    if hits.is_empty() && looks_like_challenge(html) {
        return Err(BackendError::Challenge {
            detail: "duckduckgo served an anomaly page".into(),
        });
    }
    Ok(hits)
}

/// Unwrap `//duckduckgo.com/l/?uddg=...` redirects; pass direct links through.
fn resolve_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let is_redirect = url
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && url.path().starts_with("/l/");
    if !is_redirect {
        return Some(absolute);
    }

    url.query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
        .filter(|target| target.starts_with("http"))
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        let region = query.region.as_deref().unwrap_or(DEFAULT_REGION);
        debug!(query = %query.text, region, "DuckDuckGo search");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query.text.as_str()), ("kl", region), ("b", "")])
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(BackendError::http)?;

        let html = check_status(response)
            .await?
            .text()
            .await
            .map_err(BackendError::http)?;

        parse_results(&html, query.max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body><div id="links" class="results">
          <div class="result results_links result--ad">
            <h2 class="result__title"><a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a></h2>
          </div>
          <div class="result results_links results_links_deep web-result">
            <h2 class="result__title">
              <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.khanacademy.org%2Fscience%2Fphysics%2Fgravity%3Fx%3D1&amp;rut=abc">Gravity | Khan Academy</a>
            </h2>
            <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Learn about <b>gravity</b> and
              orbits.</a>
          </div>
          <div class="result results_links web-result">
            <h2 class="result__title"><a class="result__a" href="https://openstax.org/books/physics">Physics - OpenStax</a></h2>
          </div>
        </div></body></html>
    "#;

    #[test]
    fn test_parse_results_unwraps_redirects_and_skips_ads() {
        let hits = parse_results(RESULTS_PAGE, 10).unwrap();
        assert_eq!(hits.len(), 2);

        assert_eq!(
            hits[0].url,
            "https://www.khanacademy.org/science/physics/gravity?x=1"
        );
        assert_eq!(hits[0].title, "Gravity | Khan Academy");
        assert_eq!(hits[0].snippet, "Learn about gravity and orbits.");

        assert_eq!(hits[1].url, "https://openstax.org/books/physics");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_no_results_page_is_empty_answer() {
        let html = r#"<html><body><div class="no-results">No results.</div></body></html>"#;
        assert!(parse_results(html, 10).unwrap().is_empty());
    }

    #[test]
    fn test_anomaly_page_is_challenge() {
        let html = r#"<html><body><div class="anomaly-modal__title">Unfortunately, bots use DuckDuckGo too.</div></body></html>"#;
        assert!(matches!(
            parse_results(html, 10),
            Err(BackendError::Challenge { .. })
        ));
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("//duckduckgo.com/l/?uddg=https%3A%2F%2Fck12.org%2F&rut=1").as_deref(),
            Some("https://ck12.org/")
        );
        assert_eq!(resolve_link("//duckduckgo.com/l/?rut=1"), None);
        assert_eq!(resolve_link("/relative/path"), None);
        assert_eq!(
            resolve_link("https://ck12.org/a").as_deref(),
            Some("https://ck12.org/a")
        );
    }
}
