use std::fmt::Write;

use clap::Args;
use wb_core::config::DEFAULT_ARTICLE_URL;
use wb_core::{Result, Session};

use crate::manager::{AnalyzedPage, ScraperManager};

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Article to load
    #[arg(default_value = DEFAULT_ARTICLE_URL)]
    pub url: String,
    /// Number of sentences in the summary
    #[arg(long, short = 's')]
    pub sentences: Option<usize>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    pub fn summary_sentences(&self, configured: usize) -> usize {
        self.sentences.unwrap_or(configured)
    }
}

/// Loads the article into `session` and returns the text to print.
pub async fn handle_analyze(
    args: &AnalyzeArgs,
    manager: &ScraperManager,
    session: &mut Session,
) -> Result<String> {
    let page = manager.analyze(&args.url, session).await?;
    if args.json {
        Ok(serde_json::to_string_pretty(&page)?)
    } else {
        Ok(render_page(&page))
    }
}

pub fn render_page(page: &AnalyzedPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📖 {}", page.title);
    let _ = writeln!(out, "{}", page.url);
    let _ = writeln!(out);
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "{}", page.summary);

    let _ = writeln!(out);
    if page.references.is_empty() {
        let _ = writeln!(out, "No references found.");
    } else {
        let _ = writeln!(out, "References ({}):", page.references.len());
        for reference in &page.references {
            let label = if reference.text.is_empty() { "link" } else { reference.text.as_str() };
            let _ = writeln!(out, "  - {} <{}>", label, reference.url);
        }
    }

    let _ = writeln!(out);
    if page.images.is_empty() {
        let _ = write!(out, "No images found.");
    } else {
        let _ = writeln!(out, "Images ({}):", page.images.len());
        let lines: Vec<String> = page.images.iter().map(|url| format!("  - {}", url)).collect();
        out.push_str(&lines.join("\n"));
    }
    out
}
