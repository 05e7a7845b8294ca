//! Candidate article discovery from a category listing page.
//!
//! Every anchor's `href` is resolved against the listing URL (the same value a
//! browser reports for `a.href`), empty targets are dropped, the optional URL
//! pattern is applied from the start of the string, and the result is a set.

use crate::error::FetchError;
use crate::render::{Page, Renderer};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Render the listing page and return the candidate article URLs on it.
///
/// # Arguments
///
/// * `renderer` - Renders the listing page
/// * `listing_url` - Category listing page, e.g. `https://en.somoynews.tv/categories/politics`
/// * `pattern` - Optional start-anchored article URL pattern; `None` keeps every link
///
/// # Returns
///
/// The set of non-empty, absolute link targets that match `pattern`. Order
/// carries no meaning.
///
/// # Examples
///
/// ```ignore
/// let pattern = config.url_pattern()?;
/// let urls = discover(&renderer, &config.listing_url(&category), pattern.as_ref()).await?;
/// assert!(urls.iter().all(|u| u.contains("/news/")));
/// ```
///
/// # Errors
///
/// Returns the [`FetchError`] if the listing page cannot be rendered; no
/// partial result is produced.
#[instrument(level = "info", skip(renderer, pattern))]
pub async fn discover(
    renderer: &dyn Renderer,
    listing_url: &str,
    pattern: Option<&Regex>,
) -> Result<HashSet<String>, FetchError> {
    let page = renderer.open(listing_url).await?;
    let urls = candidate_links(&page, pattern);
    info!(count = urls.len(), source = listing_url, "Discovered candidate article URLs");
    debug!(urls = ?urls, "Candidate URLs");
    Ok(urls)
}

/// Extract the deduplicated, pattern-filtered link targets of a page.
pub fn candidate_links(page: &Page, pattern: Option<&Regex>) -> HashSet<String> {
    let base = Url::parse(&page.url).ok();
    let document = page.document();

    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| match &base {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        })
        .filter(|href| pattern.is_none_or(|re| re.is_match(href)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use async_trait::async_trait;

    const LISTING: &str = r#"
        <html><body>
          <a href="https://en.somoynews.tv/news/2024-01-09/abc123">Lead</a>
          <a href="/news/2024-01-09/abc123">Lead again (relative)</a>
          <a href="https://en.somoynews.tv/news/2024-01-08/Xyz789">Second</a>
          <a href="https://en.somoynews.tv/categories/sports">Sports</a>
          <a href="https://example.com/news/2024-01-09/abc123">Foreign</a>
          <a href="">Empty</a>
          <a href="   ">Blank</a>
          <a>No href</a>
        </body></html>"#;

    fn listing_page() -> Page {
        Page::new("https://en.somoynews.tv/categories/bangladesh", LISTING)
    }

    fn pattern() -> Regex {
        ScraperConfig::default().url_pattern().unwrap().unwrap()
    }

    #[test]
    fn test_candidate_links_filters_and_dedups() {
        let links = candidate_links(&listing_page(), Some(&pattern()));
        let expected: HashSet<String> = [
            "https://en.somoynews.tv/news/2024-01-09/abc123",
            "https://en.somoynews.tv/news/2024-01-08/Xyz789",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_candidate_links_without_pattern_keeps_all_targets() {
        let links = candidate_links(&listing_page(), None);
        assert_eq!(links.len(), 4);
        assert!(links.contains("https://en.somoynews.tv/categories/sports"));
        assert!(links.contains("https://example.com/news/2024-01-09/abc123"));
    }

    #[test]
    fn test_candidate_links_is_idempotent() {
        let doubled = Page::new(
            "https://en.somoynews.tv/categories/bangladesh",
            format!("{LISTING}{LISTING}"),
        );
        assert_eq!(
            candidate_links(&doubled, Some(&pattern())),
            candidate_links(&listing_page(), Some(&pattern()))
        );
    }

    struct FailingRenderer;

    #[async_trait]
    impl Renderer for FailingRenderer {
        async fn open(&self, url: &str) -> Result<Page, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 502,
            })
        }
    }

    #[tokio::test]
    async fn test_discover_propagates_fetch_error() {
        let err = discover(&FailingRenderer, "https://en.somoynews.tv/categories/x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 502, .. }));
    }
}
