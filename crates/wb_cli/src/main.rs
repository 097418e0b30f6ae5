use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::info;
use wb_core::{http, AppConfig, Error, ImageResult, Result, Session};
use wb_inference::image::ImageGenerator;
use wb_inference::router::QuestionRouter;
use wb_inference::summarize::Summarizer;
use wb_inference::{create_answerer, Config};
use wb_scrapers::{handle_analyze, init_logging, render_page, AnalyzeArgs, ScraperManager};

mod chat;

use chat::ChatLoop;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Summarize Wikipedia articles and chat about them",
    long_about = None
)]
pub struct Cli {
    /// Answerer for questions nothing else can answer.
    /// Available: wit (default), huggingface, dummy
    #[arg(long, global = true)]
    answerer: Option<String>,
    /// Routing policy: priority (default) or classified
    #[arg(long, global = true)]
    policy: Option<String>,
    /// Comma-separated strategy chain, e.g. faq,clarify,search,external
    #[arg(long, global = true, value_delimiter = ',')]
    strategies: Option<Vec<String>>,
    /// Minimum relevance for article sentences
    #[arg(long, global = true)]
    threshold: Option<f32>,
    /// How many article sentences to answer with
    #[arg(long, global = true)]
    top_n: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch an article and print its summary, references and images
    Analyze(AnalyzeArgs),
    /// Answer one question
    Ask {
        question: String,
        /// Article to answer from
        #[arg(long)]
        url: Option<String>,
    },
    /// Generate an image from a text prompt
    Imagine {
        prompt: String,
        /// Output file. The extension is picked from the image format when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the article sources that can be analyzed
    Sources,
    /// Interactive session
    Chat {
        /// Article to load before the first question
        #[arg(long)]
        url: Option<String>,
    },
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(answerer) = &self.answerer {
            config.answerer = answerer.clone();
        }
        if let Some(policy) = &self.policy {
            config.router.policy = policy.clone();
        }
        if let Some(strategies) = &self.strategies {
            config.router.strategies = strategies.clone();
        }
        if let Some(threshold) = self.threshold {
            config.router.relevance_threshold = threshold;
        }
        if let Some(top_n) = self.top_n {
            config.router.top_n = top_n;
        }
    }
}

fn build_manager(config: &AppConfig, sentences: usize) -> Result<ScraperManager> {
    let client = http::client(config.http_timeout)?;
    Ok(ScraperManager::with_defaults(client, Summarizer::new(sentences)))
}

/// The answerer is only built, and its token only required, when the
/// `external` strategy is in the chain.
fn build_router(config: &AppConfig) -> Result<QuestionRouter> {
    let needs_answerer = config
        .router
        .strategies
        .iter()
        .any(|s| s.trim().eq_ignore_ascii_case("external"));
    let answerer = if needs_answerer {
        Some(create_answerer(&Config::from_app(config))?)
    } else {
        None
    };

    let router = QuestionRouter::from_settings(&config.router, answerer)?;
    let kinds: Vec<String> = router.strategy_kinds().iter().map(|k| k.to_string()).collect();
    info!("🧭 Router ready ({} policy): {}", router.policy(), kinds.join(" → "));
    Ok(router)
}

fn build_image_generator(config: &AppConfig) -> Result<ImageGenerator> {
    ImageGenerator::from_settings(&config.image, &config.credentials, config.http_timeout)
}

/// Writes the image, adding the format's extension when `path` has none.
pub(crate) async fn save_image(image: &ImageResult, path: PathBuf) -> Result<PathBuf> {
    let path = if path.extension().is_some() {
        path
    } else {
        path.with_extension(image.format.extension())
    };
    tokio::fs::write(&path, &image.bytes).await?;
    Ok(path)
}

fn render_sources(manager: &ScraperManager) -> String {
    manager
        .list_scrapers()
        .iter()
        .map(|source| format!("  - {}", source))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn load_article(manager: &ScraperManager, url: &str, session: &mut Session) {
    match manager.analyze(url, session).await {
        Ok(page) => println!("{}\n", render_page(&page)),
        Err(e) => eprintln!("{}", e.user_message()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let logger = init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    cli.apply(&mut config);
    logger.debug(&format!("Configuration: {:?}", config));

    match cli.command {
        Commands::Analyze(args) => {
            let manager = build_manager(&config, args.summary_sentences(config.summary_sentences))?;
            let mut session = Session::new(config.history_capacity);
            match handle_analyze(&args, &manager, &mut session).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e);
                }
            }
        }
        Commands::Ask { question, url } => {
            let router = build_router(&config)?;
            let mut session = Session::new(config.history_capacity);
            if let Some(url) = url {
                let manager = build_manager(&config, config.summary_sentences)?;
                load_article(&manager, &url, &mut session).await;
            }
            println!("{}", router.answer(&question, &mut session).await);
        }
        Commands::Imagine { prompt, out } => {
            let generator = build_image_generator(&config)?;
            info!("🎨 Generating image for '{}'", prompt);
            match generator.generate(&prompt).await {
                Ok(image) => {
                    let out = out.unwrap_or_else(|| PathBuf::from("wikibot-image"));
                    let path = save_image(&image, out).await?;
                    println!("🖼️ Saved {} bytes to {}", image.bytes.len(), path.display());
                }
                Err(failure) => {
                    eprintln!("{}", failure.user_message());
                    return Err(Error::External(anyhow!("image generation failed: {}", failure)));
                }
            }
        }
        Commands::Sources => {
            let manager = build_manager(&config, config.summary_sentences)?;
            println!("{}", render_sources(&manager));
        }
        Commands::Chat { url } => {
            let manager = build_manager(&config, config.summary_sentences)?;
            let router = build_router(&config)?;
            let images = build_image_generator(&config);
            if let Err(e) = &images {
                logger.warn(&format!("⚠️ Image generation disabled: {}", e));
            }

            let mut session = Session::new(config.history_capacity);
            if let Some(url) = url {
                load_article(&manager, &url, &mut session).await;
            }
            ChatLoop::new(manager, router, images).run(&mut session).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wb_core::ImageFormat;

    #[test]
    fn test_global_flags_override_config() {
        let cli = Cli::parse_from([
            "wikibot",
            "ask",
            "What is statistics?",
            "--answerer",
            "dummy",
            "--strategies",
            "faq,mention,external",
            "--policy",
            "classified",
            "--threshold",
            "0.25",
            "--top-n",
            "1",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.answerer, "dummy");
        assert_eq!(config.router.strategies, vec!["faq", "mention", "external"]);
        assert_eq!(config.router.policy, "classified");
        assert_eq!(config.router.relevance_threshold, 0.25);
        assert_eq!(config.router.top_n, 1);
        assert!(matches!(cli.command, Commands::Ask { .. }));
    }

    #[test]
    fn test_router_without_external_needs_no_token() {
        let mut config = AppConfig::default();
        config.router.strategies = vec!["faq".to_string(), "search".to_string()];
        assert!(build_router(&config).is_ok());

        config.router.strategies.push("external".to_string());
        assert!(matches!(build_router(&config), Err(Error::MissingCredential(_))));
    }

    #[test]
    fn test_image_generator_needs_token() {
        let config = AppConfig::default();
        assert!(matches!(build_image_generator(&config), Err(Error::MissingCredential(_))));
    }

    #[test]
    fn test_sources_lists_wikipedia() {
        let cli = Cli::parse_from(["wikibot", "sources"]);
        assert!(matches!(cli.command, Commands::Sources));

        let config = AppConfig::default();
        let manager = build_manager(&config, config.summary_sentences).unwrap();
        assert_eq!(render_sources(&manager), "  - Wikipedia (wikipedia, mediawiki)");
    }

    #[tokio::test]
    async fn test_save_image_adds_extension() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let image = ImageResult {
            prompt: "fox".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            format: ImageFormat::Jpeg,
            attempts: 1,
        };

        let path = save_image(&image, dir.join("fox")).await.unwrap();
        assert_eq!(path, dir.join("fox.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), image.bytes);

        let path = save_image(&image, dir.join("fox.jpeg")).await.unwrap();
        assert_eq!(path, dir.join("fox.jpeg"));
    }
}
