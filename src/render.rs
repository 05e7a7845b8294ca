//! Page rendering collaborator.
//!
//! The pipeline only needs "give me the HTML for this URL", so rendering is a
//! small trait, [`Renderer`]. Each call to [`Renderer::open`] returns an owned
//! [`Page`]; no current-page or DOM state lives in the renderer, which lets
//! concurrent extractions share one renderer safely.
//!
//! [`HttpRenderer`] fetches pages directly, or through a Browserless
//! `/content` endpoint when the site needs JavaScript to produce its markup.
//!
//! DOM querying happens on a parsed [`scraper::Html`] obtained from
//! [`Page::document`]. Parse and query synchronously; `Html` is not `Send`.

use crate::config::RenderConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested.
    pub url: String,
    /// Rendered HTML.
    pub html: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Something that turns a URL into a rendered [`Page`].
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open(&self, url: &str) -> Result<Page, FetchError>;
}

/// Renders pages over HTTP, optionally via Browserless.
pub struct HttpRenderer {
    client: reqwest::Client,
    browserless: Option<(String, Option<String>)>,
    timeout: Duration,
}

impl std::fmt::Debug for HttpRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRenderer")
            .field("browserless", &self.browserless.as_ref().map(|(url, _)| url))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpRenderer {
    /// Build the HTTP client. Failure here is fatal for the run.
    ///
    /// The render timeout is enforced once, around each [`Renderer::open`]
    /// call, so an expired render is always [`FetchError::Timeout`].
    pub fn connect(config: &RenderConfig) -> Result<Self, FetchError> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let browserless = config
            .browserless_url
            .as_ref()
            .map(|base| (base.trim_end_matches('/').to_string(), config.browserless_token.clone()));

        Ok(Self {
            client,
            browserless,
            timeout,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request = match &self.browserless {
            Some((base, token)) => {
                let mut endpoint = format!("{base}/content");
                if let Some(token) = token {
                    endpoint.push_str(&format!("?token={}", urlencoding::encode(token)));
                }
                self.client
                    .post(&endpoint)
                    .json(&serde_json::json!({ "url": url }))
            }
            None => self.client.get(url),
        };

        let http_err = |e: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = request.send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(http_err)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    #[instrument(level = "debug", skip(self))]
    async fn open(&self, url: &str) -> Result<Page, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let t0 = Instant::now();
        let html = match tokio::time::timeout(self.timeout, self.fetch(url)).await {
            Ok(res) => res?,
            Err(_) => {
                warn!(%url, "Render timed out");
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };
        debug!(%url, bytes = html.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "Rendered page");
        Ok(Page::new(url, html))
    }
}

/// Compile a CSS selector. Selectors come from code or configuration, so a
/// bad one is reported as a missing element rather than a panic.
pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First element matching `css` anywhere under `scope`.
pub fn query_one<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    scope.select(&sel).next()
}

/// Visible text of an element, whitespace-collapsed.
///
/// Text nodes are concatenated as-is, so inline markup inside a word
/// (`Sci<b>ence</b>`) does not split it.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_document_queries() {
        let page = Page::new(
            "https://example.com",
            r#"<html><body><div id="news1"><a href="/c"><span>  SPORTS </span><span>x</span></a></div></body></html>"#,
        );
        let doc = page.document();
        let label = query_one(doc.root_element(), "div#news1 a")
            .and_then(|a| query_one(a, "span"))
            .map(element_text);
        assert_eq!(label.as_deref(), Some("SPORTS"));
    }

    #[test]
    fn test_query_one_bad_selector() {
        let doc = Html::parse_document("<p>hi</p>");
        assert!(query_one(doc.root_element(), "p[").is_none());
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = Html::parse_document("<p>Hello\n   <b>big</b>   world</p>");
        let p = query_one(doc.root_element(), "p").unwrap();
        assert_eq!(element_text(p), "Hello big world");
    }

    #[test]
    fn test_element_text_keeps_words_split_by_markup() {
        let doc = Html::parse_document("<span>Sci<b>ence</b> &amp; <i>Tech</i></span>");
        let span = query_one(doc.root_element(), "span").unwrap();
        assert_eq!(element_text(span), "Science & Tech");
    }

    #[test]
    fn test_connect_direct_and_browserless() {
        let direct = HttpRenderer::connect(&RenderConfig::default()).unwrap();
        assert!(direct.browserless.is_none());

        let config = RenderConfig {
            browserless_url: Some("http://localhost:3000/".to_string()),
            browserless_token: Some("secret".to_string()),
            timeout_secs: 5,
        };
        let via = HttpRenderer::connect(&config).unwrap();
        assert_eq!(via.browserless.as_ref().unwrap().0, "http://localhost:3000");
        assert_eq!(via.timeout, Duration::from_secs(5));
        assert!(!format!("{via:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_open_stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // accept and hold the connection without ever replying
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = RenderConfig {
            timeout_secs: 1,
            ..RenderConfig::default()
        };
        let renderer = HttpRenderer::connect(&config).unwrap();
        let url = format!("http://{addr}/news/2024-01-09/abc123");
        let err = renderer.open(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout { secs: 1, .. }));
        server.abort();
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_url() {
        let renderer = HttpRenderer::connect(&RenderConfig::default()).unwrap();
        let err = renderer.open("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
