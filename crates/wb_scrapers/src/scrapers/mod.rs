use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;
use wb_core::{Article, Error, Reference, Result};

pub mod wikipedia;

pub use wikipedia::WikipediaScraper;

/// Everything pulled out of one page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    pub article: Article,
    pub references: Vec<Reference>,
    /// Absolute image URLs in document order
    pub images: Vec<String>,
}

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the name of the source
    fn source(&self) -> &str;

    /// Returns true if this scraper can handle the given URL
    fn can_handle(&self, url: &Url) -> bool;

    /// Fetches `url` once and extracts the article, its references and images
    async fn scrape_page(&self, url: &Url) -> Result<ScrapedPage>;

    /// Returns a list of CLI shorthand names for this scraper
    fn cli_names(&self) -> Vec<&str> {
        vec![]
    }
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;

    /// Only absolute http(s) URLs are fetched.
    pub fn parse_url(url: &str) -> Result<Url> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUrl("empty URL".to_string()));
        }

        let parsed =
            Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(Error::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, trimmed
            ))),
        }
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector {}: {:?}", css, e)))
    }

    pub fn extract_text(document: &Html, css: &str) -> Option<String> {
        let selector = selector(css).ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// Resolves `href` against the page URL, skipping what cannot be joined.
    pub fn resolve(base: &Url, href: &str) -> Option<String> {
        base.join(href.trim()).ok().map(String::from)
    }
}
