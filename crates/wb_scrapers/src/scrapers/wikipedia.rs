//! MediaWiki article pages (Wikipedia and its mirrors).

use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;
use wb_core::{Article, Error, Reference, Result};

use super::utils;
use crate::scrapers::{ScrapedPage, Scraper};

lazy_static! {
    static ref BODY_CONTENT: Selector =
        Selector::parse("#mw-content-text div.mw-parser-output").expect("static selector");
    static ref ANY_CONTENT: Selector =
        Selector::parse("div.mw-parser-output").expect("static selector");
    static ref PARAGRAPH: Selector = Selector::parse("p").expect("static selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("static selector");
    static ref IMAGE: Selector = Selector::parse("img[src]").expect("static selector");
}

const REFERENCES_ID: &str = "References";

#[derive(Debug, Clone)]
pub struct WikipediaScraper {
    client: Client,
}

impl WikipediaScraper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Extraction without the network round trip.
    pub fn parse_page(url: &Url, html: &str) -> Result<ScrapedPage> {
        let document = Html::parse_document(html);
        let raw_text = extract_article_text(&document)
            .map_err(|e| Error::Parse(format!("{} in {}", e, url)))?;

        Ok(ScrapedPage {
            article: Article::new(url.as_str(), extract_title(&document, url), raw_text),
            references: extract_references(&document, url),
            images: extract_images(&document, url),
        })
    }
}

#[async_trait]
impl Scraper for WikipediaScraper {
    fn source(&self) -> &str {
        "Wikipedia"
    }

    /// Any http(s) page; the MediaWiki layout is checked when parsing.
    fn can_handle(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    async fn scrape_page(&self, url: &Url) -> Result<ScrapedPage> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned HTTP {}", url, status.as_u16())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;
        tracing::debug!("Fetched {} bytes from {}", html.len(), url);

        Self::parse_page(url, &html)
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["wikipedia", "mediawiki"]
    }
}

/// Paragraph text of the main content container, one paragraph per line.
pub fn extract_article_text(document: &Html) -> Result<String> {
    let container = document
        .select(&BODY_CONTENT)
        .next()
        .or_else(|| document.select(&ANY_CONTENT).next())
        .ok_or_else(|| Error::Parse("no div.mw-parser-output content container".to_string()))?;

    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect();
    Ok(paragraphs.join("\n"))
}

pub fn extract_title(document: &Html, url: &Url) -> String {
    if let Some(title) = utils::extract_text(document, "h1#firstHeading") {
        return title;
    }
    if let Some(title) = utils::extract_text(document, "title") {
        return title.trim_end_matches(" - Wikipedia").to_string();
    }

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| segment.replace('_', " "))
        .unwrap_or_else(|| url.to_string())
}

/// Links of the first list that follows the `References` anchor in
/// document order.
pub fn extract_references(document: &Html, url: &Url) -> Vec<Reference> {
    let list = match references_list(document) {
        Some(list) => list,
        None => return Vec::new(),
    };

    list.select(&LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            Some(Reference {
                text: link.text().collect::<String>().trim().to_string(),
                url: utils::resolve(url, href)?,
            })
        })
        .collect()
}

fn references_list(document: &Html) -> Option<ElementRef<'_>> {
    let mut after_heading = false;
    for node in document.root_element().descendants() {
        let element = match ElementRef::wrap(node) {
            Some(element) => element,
            None => continue,
        };

        if !after_heading {
            after_heading = element.value().id() == Some(REFERENCES_ID);
            continue;
        }
        if matches!(element.value().name(), "ol" | "ul") {
            return Some(element);
        }
    }
    None
}

/// Every `img` with a `src`, resolved to an absolute URL.
pub fn extract_images(document: &Html, url: &Url) -> Vec<String> {
    document
        .select(&IMAGE)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| utils::resolve(url, src))
        .collect()
}
