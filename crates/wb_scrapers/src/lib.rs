pub mod cli;
pub mod logging;
pub mod manager;
pub mod scrapers;

pub use cli::{handle_analyze, render_page, AnalyzeArgs};
pub use logging::{init_logging, Logger};
pub use manager::{AnalyzedPage, ScraperManager};
pub use scrapers::{ScrapedPage, Scraper, WikipediaScraper};

pub mod prelude {
    pub use super::manager::{AnalyzedPage, ScraperManager};
    pub use super::scrapers::Scraper;
    pub use wb_core::{Article, Error, Result};
}
