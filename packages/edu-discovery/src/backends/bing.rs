//! Bing result-page backend.
//!
//! Fetches `https://www.bing.com/search` and scrapes organic results
//! (`.b_algo`). The market is pinned so results do not drift with the
//! server's geo-IP guess.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use scraper::Html;
use tracing::debug;
use url::Url;

use super::{check_status, clean_text, http_client, selector, BROWSER_USER_AGENT};
use crate::error::{BackendError, BackendResult, ConfigResult};
use crate::executor::looks_like_challenge;
use crate::traits::backend::{SearchBackend, SearchQuery};
use crate::types::result::RawHit;

const SEARCH_URL: &str = "https://www.bing.com/search";

/// Bing accepts at most 50 results per page.
const MAX_COUNT: usize = 50;

pub struct BingBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl BingBackend {
    pub fn new() -> ConfigResult<Self> {
        Ok(Self {
            client: http_client(BROWSER_USER_AGENT)?,
            endpoint: SEARCH_URL.to_string(),
        })
    }

    /// Point at a different endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Market (`setmkt`) and country (`cc`) for a region hint like `us-en`.
pub fn market_for(region: Option<&str>) -> (String, String) {
    let parsed = region.and_then(|r| {
        let (country, lang) = r.trim().split_once('-')?;
        if country.len() == 2 && lang.len() == 2 {
            Some((country.to_uppercase(), lang.to_lowercase()))
        } else {
            None
        }
    });
    match parsed {
        Some((country, lang)) => (format!("{lang}-{country}"), country),
        None => ("en-US".to_string(), "US".to_string()),
    }
}

/// Scrape organic results from a Bing result page.
///
/// A page with no results that looks like a captcha or bot wall is an
/// error, not an empty answer.
pub fn parse_results(html: &str, limit: usize) -> BackendResult<Vec<RawHit>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".b_algo")?;
    let title_sel = selector("h2 a")?;
    let snippet_sel = selector(".b_caption p, p.b_lineclamp2, p.b_lineclamp3, p.b_algoSlug")?;

    let mut hits: Vec<RawHit> = Vec::new();
    for item in document.select(&result_sel) {
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
            .map(|p| clean_text(p.text()))
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
            detail: "bing served a verification page".into(),
        });
    }
    Ok(hits)
}

/// Absolute target of a result link. Bing wraps some links in
/// `/ck/a?...&u=a1<base64url>` click trackers.
fn resolve_link(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let is_tracker = url
        .host_str()
        .is_some_and(|h| h.ends_with("bing.com"))
        && url.path().starts_with("/ck/");
    if !is_tracker {
        return Some(href.to_string());
    }

    let encoded = url
        .query_pairs()
        .find(|(k, _)| k == "u")
        .map(|(_, v)| v.into_owned())?;
    let payload = encoded.strip_prefix("a1").unwrap_or(&encoded);
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let target = String::from_utf8(bytes).ok()?;
    target.starts_with("http").then_some(target)
}

#[async_trait]
impl SearchBackend for BingBackend {
    fn name(&self) -> &'static str {
        "bing"
    }

    async fn search(&self, query: &SearchQuery) -> BackendResult<Vec<RawHit>> {
        let count = query.max_results.clamp(1, MAX_COUNT);
        let (market, country) = market_for(query.region.as_deref());
        debug!(query = %query.text, count, market = %market, "Bing search");

        let count = count.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query.text.as_str()),
                ("count", count.as_str()),
                ("setmkt", market.as_str()),
                ("setlang", market.as_str()),
                ("cc", country.as_str()),
            ])
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
        <html><body><ol id="b_results">
          <li class="b_algo">
            <h2><a href="https://www.ck12.org/physics/gravity/">Gravity | <strong>CK-12</strong></a></h2>
            <div class="b_caption"><p>Gravity is the   force that attracts
              two bodies toward each other.</p></div>
          </li>
          <li class="b_algo">
            <h2><a href="https://www.bing.com/ck/a?!&amp;&amp;p=abc&amp;u=a1aHR0cHM6Ly9vcGVuc3RheC5vcmcvYm9va3MvcGh5c2ljcy8&amp;ntb=1">OpenStax Physics</a></h2>
            <div class="b_caption"><p>Free textbook.</p></div>
          </li>
          <li class="b_algo">
            <h2><a href="https://www.ck12.org/physics/gravity/">Duplicate</a></h2>
          </li>
          <li class="b_ad"><h2><a href="https://ads.example/">Ad</a></h2></li>
          <li class="b_algo"><h2><a href="javascript:void(0)">Broken</a></h2></li>
        </ol></body></html>
    "#;

    #[test]
    fn test_parse_results() {
        let hits = parse_results(RESULTS_PAGE, 10).unwrap();
        assert_eq!(hits.len(), 2);

        assert_eq!(hits[0].url, "https://www.ck12.org/physics/gravity/");
        assert_eq!(hits[0].title, "Gravity | CK-12");
        assert_eq!(
            hits[0].snippet,
            "Gravity is the force that attracts two bodies toward each other."
        );

        assert_eq!(hits[1].url, "https://openstax.org/books/physics/");
        assert_eq!(hits[1].snippet, "Free textbook.");
    }

    #[test]
    fn test_parse_respects_limit() {
        let hits = parse_results(RESULTS_PAGE, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_empty_page_is_empty_answer() {
        let html = r#"<html><body><ol id="b_results"><li class="b_no">No results for this query</li></ol></body></html>"#;
        assert!(parse_results(html, 10).unwrap().is_empty());
    }

    #[test]
    fn test_captcha_page_is_challenge() {
        let html = r#"<html><body><div id="b_captcha">Please solve the challenge below.</div>
            <script src="https://www.bing.com/captcha/challenge.js"></script></body></html>"#;
        assert!(matches!(
            parse_results(html, 10),
            Err(BackendError::Challenge { .. })
        ));
    }

    #[test]
    fn test_market_for_region() {
        assert_eq!(market_for(Some("us-en")), ("en-US".into(), "US".into()));
        assert_eq!(market_for(Some("uk-en")), ("en-UK".into(), "UK".into()));
        assert_eq!(market_for(Some("wt-wt-x")), ("en-US".into(), "US".into()));
        assert_eq!(market_for(None), ("en-US".into(), "US".into()));
    }
}
