//! Scrapers for the news site.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Discovery** ([`discover`]): render a category listing page and collect
//!    candidate article URLs
//! 2. **Extraction** ([`article`]): render each candidate and turn it into a
//!    scored [`ArticleRecord`](crate::models::ArticleRecord)
//!
//! Both phases go through the [`Renderer`](crate::render::Renderer) trait, so
//! tests drive them with canned HTML.

pub mod article;
pub mod discover;
