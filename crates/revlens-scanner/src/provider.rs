//! Image providers: sources of representative images for a query.
//!
//! Two families exist: API-backed providers (DuckDuckGo) reached over plain
//! HTTP, and browser-scraped providers (Bing and Google image search) that
//! render the results page and harvest thumbnails.

use crate::consent::{ConsentResolver, ConsentTrigger};
use crate::error::{Result, SearchError};
use crate::scrape::{extract_candidates, ScrapeFilter};
use async_trait::async_trait;
use rand::Rng;
use revlens_browser::{BrowserContext, BrowserSession, ContextIdentity, WaitUntil};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A source of images for a query, tried in cascade order.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Stable provider name for logging and ordering.
    fn name(&self) -> &str;

    /// Fetch up to `limit` image URLs for the query.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct DdgImageResponse {
    #[serde(default)]
    results: Vec<DdgImage>,
}

#[derive(Debug, Deserialize)]
struct DdgImage {
    image: Option<String>,
}

/// DuckDuckGo image lookup over its JSON endpoint.
///
/// A throwaway `vqd` token is harvested from the HTML search page first;
/// the `i.js` endpoint rejects requests without one.
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .build()?;
        Ok(Self { client })
    }

    fn extract_vqd(html: &str) -> Option<String> {
        let start = html.find("vqd=")? + "vqd=".len();
        let rest = &html[start..];
        let token = match rest.as_bytes().first()? {
            b'"' => rest[1..].split('"').next()?,
            b'\'' => rest[1..].split('\'').next()?,
            _ => rest
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                .next()?,
        };
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

#[async_trait]
impl ImageProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let token_page = self
            .client
            .get("https://duckduckgo.com/")
            .query(&[("q", query)])
            .send()
            .await?
            .text()
            .await?;

        let vqd = Self::extract_vqd(&token_page).ok_or_else(|| SearchError::Provider {
            name: self.name().to_string(),
            reason: "no vqd token in search page".to_string(),
        })?;

        let response: DdgImageResponse = self
            .client
            .get("https://duckduckgo.com/i.js")
            .query(&[
                ("l", "us-en"),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("p", "-1"),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(|r| r.image)
            .take(limit)
            .collect())
    }
}

/// Parameters of one browser-scraped image provider.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeProviderSpec {
    pub name: &'static str,
    pub query_url: fn(&str) -> String,
    pub consent: &'static [ConsentTrigger],
    pub selectors: &'static str,
    pub filter: ScrapeFilter,
    /// Post-navigation settle range in milliseconds.
    pub settle_ms: (u64, u64),
}

fn bing_forward_url(query: &str) -> String {
    Url::parse_with_params(
        "https://www.bing.com/images/search",
        &[("q", query), ("adlt", "off")],
    )
    .expect("static base URL")
    .to_string()
}

fn google_forward_url(query: &str) -> String {
    Url::parse_with_params(
        "https://www.google.com/search",
        &[("tbm", "isch"), ("q", query), ("safe", "off")],
    )
    .expect("static base URL")
    .to_string()
}

impl ScrapeProviderSpec {
    /// Bing image search: lenient, no consent overlay in practice.
    pub fn bing() -> Self {
        Self {
            name: "bing-images",
            query_url: bing_forward_url,
            consent: &[],
            selectors: ".mimg",
            filter: ScrapeFilter {
                min_len: 0,
                denylist: &[],
            },
            settle_ms: (1000, 2500),
        }
    }

    /// Google image search: slower, consent-gated in the EU.
    pub fn google() -> Self {
        Self {
            name: "google-images",
            query_url: google_forward_url,
            consent: &[ConsentTrigger::Button("Reject all")],
            selectors: "img",
            filter: ScrapeFilter {
                min_len: 50,
                denylist: &["googleg", ".svg"],
            },
            settle_ms: (1500, 3000),
        }
    }
}

/// A provider that renders an image-search results page in its own browser
/// context and harvests thumbnails.
pub struct BrowserImageProvider {
    session: Arc<dyn BrowserSession>,
    spec: ScrapeProviderSpec,
    nav_timeout: Duration,
}

impl BrowserImageProvider {
    pub fn new(
        session: Arc<dyn BrowserSession>,
        spec: ScrapeProviderSpec,
        nav_timeout: Duration,
    ) -> Self {
        Self {
            session,
            spec,
            nav_timeout,
        }
    }

    async fn fetch_in_context(
        &self,
        context: &dyn BrowserContext,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let page = context.new_page().await?;

        let outcome = async {
            let url = (self.spec.query_url)(query);
            page.navigate(&url, self.nav_timeout, WaitUntil::DomContentLoaded)
                .await?;

            if !self.spec.consent.is_empty() {
                ConsentResolver::new().dismiss(&*page, self.spec.consent).await;
            }

            let settle = {
                let (min, max) = self.spec.settle_ms;
                rand::thread_rng().gen_range(min..=max)
            };
            tokio::time::sleep(Duration::from_millis(settle)).await;

            let html = page.content().await?;
            let images = extract_candidates(&html, self.spec.selectors, &self.spec.filter);
            Ok::<Vec<String>, SearchError>(images.into_iter().take(limit).collect())
        }
        .await;

        let _ = page.close().await;
        outcome
    }
}

#[async_trait]
impl ImageProvider for BrowserImageProvider {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let context = self
            .session
            .new_context(ContextIdentity::randomized())
            .await?;
        let outcome = self.fetch_in_context(&*context, query, limit).await;
        let _ = context.close().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revlens_browser::mock::{MockSession, PageScript};

    #[test]
    fn test_extract_vqd_quoted() {
        let html = r#"<script>vqd="4-123456789012345678901234567890";</script>"#;
        assert_eq!(
            DuckDuckGoProvider::extract_vqd(html).as_deref(),
            Some("4-123456789012345678901234567890")
        );
    }

    #[test]
    fn test_extract_vqd_bare() {
        let html = "https://duckduckgo.com/i.js?q=x&vqd=4-99887766&o=json";
        assert_eq!(
            DuckDuckGoProvider::extract_vqd(html).as_deref(),
            Some("4-99887766")
        );
    }

    #[test]
    fn test_extract_vqd_missing() {
        assert!(DuckDuckGoProvider::extract_vqd("<html></html>").is_none());
    }

    #[test]
    fn test_forward_urls_encode_query() {
        let url = bing_forward_url("jane doe");
        assert!(url.starts_with("https://www.bing.com/images/search?"));
        assert!(url.contains("q=jane+doe") || url.contains("q=jane%20doe"));
        assert!(url.contains("adlt=off"));

        let url = google_forward_url("chadi0x");
        assert!(url.contains("tbm=isch"));
        assert!(url.contains("safe=off"));
    }

    #[tokio::test]
    async fn test_browser_provider_scrapes_and_releases() {
        let session = Arc::new(MockSession::new());
        session.script_fallback(PageScript {
            html: r#"<img class="mimg" src="https://th.example.net/images/first.jpg">
                     <img class="mimg" src="https://th.example.net/images/second.jpg">"#
                .to_string(),
            ..PageScript::default()
        });
        let ledger = session.ledger();

        let mut spec = ScrapeProviderSpec::bing();
        spec.settle_ms = (0, 0);

        let provider = BrowserImageProvider::new(
            session.clone() as Arc<dyn BrowserSession>,
            spec,
            Duration::from_secs(5),
        );
        let images = provider.fetch("jane doe", 5).await.expect("fetch");

        assert_eq!(
            images,
            vec![
                "https://th.example.net/images/first.jpg",
                "https://th.example.net/images/second.jpg",
            ]
        );
        assert!(ledger.balanced(), "context/page must be released");
    }

    #[tokio::test]
    async fn test_browser_provider_releases_on_navigation_failure() {
        let session = Arc::new(MockSession::new());
        session.script_fallback(PageScript {
            navigation_error: Some("net::ERR_TIMED_OUT".to_string()),
            ..PageScript::default()
        });
        let ledger = session.ledger();

        let mut spec = ScrapeProviderSpec::bing();
        spec.settle_ms = (0, 0);

        let provider = BrowserImageProvider::new(
            session.clone() as Arc<dyn BrowserSession>,
            spec,
            Duration::from_secs(5),
        );
        let err = provider.fetch("jane doe", 5).await.expect_err("must fail");
        assert!(err.to_string().contains("ERR_TIMED_OUT"));
        assert!(ledger.balanced(), "resources released on the error path");
    }
}
