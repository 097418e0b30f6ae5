use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::info;
use wb_core::{Error, Result, Session};
use wb_inference::image::ImageGenerator;
use wb_inference::router::QuestionRouter;
use wb_scrapers::{render_page, ScraperManager};

const HELP: &str = "Type a question, or one of:
  :analyze URL    load a new article
  :image PROMPT   generate an image in the background
  :summary        summarize the current article
  :clear          forget the current article
  :history        show recent questions and answers
  :quit           leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Analyze(String),
    Image(String),
    Summary,
    Clear,
    History,
    Help,
    Quit,
    Unknown(String),
}

impl ChatCommand {
    /// `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let rest = match line.strip_prefix(':') {
            Some(rest) => rest,
            None => return Some(ChatCommand::Ask(line.to_string())),
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        let command = match (name.to_lowercase().as_str(), argument.is_empty()) {
            ("analyze" | "a", false) => ChatCommand::Analyze(argument.to_string()),
            ("image" | "i", false) => ChatCommand::Image(argument.to_string()),
            ("summary" | "s", _) => ChatCommand::Summary,
            ("clear" | "c", _) => ChatCommand::Clear,
            ("history" | "h", _) => ChatCommand::History,
            ("help" | "?", _) => ChatCommand::Help,
            ("quit" | "q" | "exit", _) => ChatCommand::Quit,
            _ => ChatCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Interactive loop. Questions are answered in order; image jobs run on a
/// single background worker and report when they finish.
pub struct ChatLoop {
    manager: ScraperManager,
    router: QuestionRouter,
    images: std::result::Result<Arc<ImageGenerator>, Error>,
    image_worker: Arc<Semaphore>,
    image_jobs: Vec<JoinHandle<()>>,
    image_count: usize,
}

impl ChatLoop {
    pub fn new(
        manager: ScraperManager,
        router: QuestionRouter,
        images: std::result::Result<ImageGenerator, Error>,
    ) -> Self {
        Self {
            manager,
            router,
            images: images.map(Arc::new),
            image_worker: Arc::new(Semaphore::new(1)),
            image_jobs: Vec::new(),
            image_count: 0,
        }
    }

    pub async fn run(&mut self, session: &mut Session) -> Result<()> {
        println!("{}", HELP);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let line = match lines.next_line().await? {
                Some(line) => line,
                None => break,
            };
            let command = match ChatCommand::parse(&line) {
                Some(command) => command,
                None => continue,
            };
            if command == ChatCommand::Quit {
                break;
            }
            self.handle(command, session).await;
        }

        self.finish_image_jobs().await;
        println!("👋 Bye!");
        Ok(())
    }

    async fn handle(&mut self, command: ChatCommand, session: &mut Session) {
        match command {
            ChatCommand::Ask(question) => {
                let answer = self.router.answer(&question, session).await;
                println!("{}", answer);
            }
            ChatCommand::Analyze(url) => match self.manager.analyze(&url, session).await {
                Ok(page) => println!("{}", render_page(&page)),
                Err(e) => println!("{}", e.user_message()),
            },
            ChatCommand::Image(prompt) => self.spawn_image_job(prompt),
            ChatCommand::Summary => match session.article() {
                Some(article) => {
                    println!("📖 {}", article.title);
                    println!("{}", self.manager.summarizer().summarize(&article.raw_text));
                }
                None => println!("No article loaded. Use :analyze URL first."),
            },
            ChatCommand::Clear => match session.clear_article() {
                Some(article) => println!("Forgot '{}'.", article.title),
                None => println!("No article loaded."),
            },
            ChatCommand::History => {
                if session.history().is_empty() {
                    println!("Nothing asked yet.");
                }
                for entry in session.history().iter() {
                    println!("[{}] Q: {}", entry.timestamp.format("%H:%M:%S"), entry.question);
                    println!("           A: {}", entry.answer);
                }
            }
            ChatCommand::Help => println!("{}", HELP),
            ChatCommand::Unknown(line) => {
                println!("Unknown command '{}'. Type :help for the list.", line)
            }
            ChatCommand::Quit => {}
        }
    }

    fn spawn_image_job(&mut self, prompt: String) {
        let generator = match &self.images {
            Ok(generator) => generator.clone(),
            Err(e) => {
                println!("{}", e.user_message());
                return;
            }
        };

        self.image_count += 1;
        let path = PathBuf::from(format!("wikibot-image-{}", self.image_count));
        let worker = self.image_worker.clone();
        println!("🎨 Queued image #{}: {}", self.image_count, prompt);

        self.image_jobs.retain(|job| !job.is_finished());
        self.image_jobs.push(tokio::spawn(async move {
            let _permit = match worker.acquire().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            match generator.generate(&prompt).await {
                Ok(image) => match crate::save_image(&image, path).await {
                    Ok(path) => println!("\n🖼️ Image for '{}' saved to {}", prompt, path.display()),
                    Err(e) => println!("\n{}", e.user_message()),
                },
                Err(failure) => println!("\n{}", failure.user_message()),
            }
        }));
    }

    async fn finish_image_jobs(&mut self) {
        let pending: Vec<JoinHandle<()>> = self
            .image_jobs
            .drain(..)
            .filter(|job| !job.is_finished())
            .collect();
        if pending.is_empty() {
            return;
        }

        info!("⏳ Waiting for {} image job(s)", pending.len());
        for job in pending {
            if let Err(e) = job.await {
                tracing::warn!("Image job ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wb_core::{AppConfig, Article};

    #[test]
    fn test_parse_questions_and_commands() {
        assert_eq!(ChatCommand::parse("   "), None);
        assert_eq!(
            ChatCommand::parse(" What is a median? "),
            Some(ChatCommand::Ask("What is a median?".to_string()))
        );
        assert_eq!(
            ChatCommand::parse(":analyze https://en.wikipedia.org/wiki/Median"),
            Some(ChatCommand::Analyze("https://en.wikipedia.org/wiki/Median".to_string()))
        );
        assert_eq!(
            ChatCommand::parse(":image   a histogram made of flowers"),
            Some(ChatCommand::Image("a histogram made of flowers".to_string()))
        );
        assert_eq!(ChatCommand::parse(":Summary"), Some(ChatCommand::Summary));
        assert_eq!(ChatCommand::parse(":history"), Some(ChatCommand::History));
        assert_eq!(ChatCommand::parse(":clear"), Some(ChatCommand::Clear));
        assert_eq!(ChatCommand::parse(":q"), Some(ChatCommand::Quit));
    }

    #[test]
    fn test_parse_commands_missing_argument() {
        assert_eq!(
            ChatCommand::parse(":analyze"),
            Some(ChatCommand::Unknown(":analyze".to_string()))
        );
        assert_eq!(ChatCommand::parse(":dance"), Some(ChatCommand::Unknown(":dance".to_string())));
    }

    #[tokio::test]
    async fn test_clear_forgets_article() {
        let mut config = AppConfig::default();
        config.router.strategies = vec!["faq".to_string(), "clarify".to_string()];
        let manager = crate::build_manager(&config, 3).unwrap();
        let router = crate::build_router(&config).unwrap();
        let images = Err(Error::MissingCredential("HF_API_TOKEN".to_string()));
        let mut chat = ChatLoop::new(manager, router, images);

        let mut session = Session::new(5);
        session.set_article(Article::new(
            "https://en.wikipedia.org/wiki/Median",
            "Median",
            "A median splits data.",
        ));
        session.record("What is a median?", "The middle value.");
        chat.handle(ChatCommand::Clear, &mut session).await;
        assert!(session.article().is_none());
        assert_eq!(session.history().len(), 1);

        chat.handle(ChatCommand::Clear, &mut session).await;
        assert!(session.article().is_none());
    }
}
