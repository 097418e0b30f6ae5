use serde::Serialize;
use url::Url;
use wb_core::{Error, Reference, Result, Session};
use wb_inference::summarize::Summarizer;

use crate::logging::Logger;
use crate::scrapers::utils::parse_url;
use crate::scrapers::{Scraper, WikipediaScraper};

type BoxedScraper = Box<dyn Scraper + Send + Sync>;

/// What the user sees after loading an article.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzedPage {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub references: Vec<Reference>,
    pub images: Vec<String>,
}

pub struct ScraperManager {
    scrapers: Vec<BoxedScraper>,
    summarizer: Summarizer,
}

impl ScraperManager {
    pub fn new(summarizer: Summarizer) -> Self {
        Self {
            scrapers: Vec::new(),
            summarizer,
        }
    }

    /// Manager with the Wikipedia scraper registered.
    pub fn with_defaults(client: reqwest::Client, summarizer: Summarizer) -> Self {
        let mut manager = Self::new(summarizer);
        manager.add_scraper(Box::new(WikipediaScraper::new(client)));
        manager
    }

    pub fn add_scraper(&mut self, scraper: BoxedScraper) {
        self.scrapers.push(scraper);
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn get_scraper_for_url(&self, url: &Url) -> Result<&BoxedScraper> {
        self.scrapers
            .iter()
            .find(|s| s.can_handle(url))
            .ok_or_else(|| Error::InvalidUrl(format!("No scraper found for URL: {}", url)))
    }

    /// Fetches and summarizes the article at `url`, then makes it the
    /// session's current article. On any failure the session keeps the
    /// article it had.
    pub async fn analyze(&self, url: &str, session: &mut Session) -> Result<AnalyzedPage> {
        let url = parse_url(url)?;
        let scraper = self.get_scraper_for_url(&url)?;
        let logger = Logger::new().with_prefix(format!("[{}]", scraper.source()));

        logger.info(&format!("📰 Fetching {}", url));
        let page = match scraper.scrape_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                logger.error(&format!("❌ Could not load {}: {}", url, e));
                return Err(e);
            }
        };

        let summary = self.summarizer.summarize(&page.article.raw_text);
        logger.info(&format!(
            "✨ {}: {} references, {} images",
            page.article.title,
            page.references.len(),
            page.images.len()
        ));

        let analyzed = AnalyzedPage {
            url: page.article.source_url.clone(),
            title: page.article.title.clone(),
            summary,
            references: page.references,
            images: page.images,
        };
        if let Some(previous) = session.set_article(page.article) {
            logger.debug(&format!("Replaced article {}", previous.source_url));
        }
        Ok(analyzed)
    }

    pub fn list_scrapers(&self) -> Vec<String> {
        self.scrapers
            .iter()
            .map(|s| format!("{} ({})", s.source(), s.cli_names().join(", ")))
            .collect()
    }
}
