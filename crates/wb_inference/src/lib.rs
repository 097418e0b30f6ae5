use std::time::Duration;

use wb_core::config::Credentials;
use wb_core::AppConfig;

pub mod image;
pub mod models;
pub mod router;
pub mod search;
pub mod summarize;

/// What the answerer factory needs out of the application config.
#[derive(Debug, Clone)]
pub struct Config {
    pub answerer: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub qa_model_url: String,
}

impl Config {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            answerer: app.answerer.clone(),
            credentials: app.credentials.clone(),
            timeout: app.http_timeout,
            qa_model_url: app.qa_model_url.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

pub mod prelude {
    pub use super::image::{GenerationFailure, ImageGenerator, RetryPolicy};
    pub use super::models::create_answerer;
    pub use super::router::{QuestionRouter, RoutingPolicy};
    pub use super::search::ArticleSearcher;
    pub use super::summarize::Summarizer;
    pub use super::Config;
    pub use wb_core::{Article, Error, Result, Session};
}

pub use models::create_answerer;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::router::NO_ANSWER_REPLY;
    use wb_core::AppConfig;

    #[tokio::test]
    async fn test_inference_pipeline() {
        let mut app = AppConfig::default();
        app.answerer = "dummy".to_string();
        app.router.strategies = vec!["faq".to_string(), "search".to_string()];
        app.router.top_n = 1;

        let answerer = create_answerer(&Config::from_app(&app)).unwrap();
        let router = QuestionRouter::from_settings(&app.router, Some(answerer)).unwrap();
        let mut session = Session::new(app.history_capacity);

        session.set_article(Article::new(
            "https://en.wikipedia.org/wiki/Median",
            "Median",
            "The median is the middle value of a data set. It is robust to outliers.",
        ));
        let summary = Summarizer::new(1).summarize(&session.article().unwrap().raw_text);
        assert_eq!(summary, "The median is the middle value of a data set.");

        let reply = router.answer("Why is the median robust to outliers?", &mut session).await;
        assert_eq!(reply, "From the article: It is robust to outliers.");

        let reply = router.answer("Volcanoes?", &mut session).await;
        assert_eq!(reply, NO_ANSWER_REPLY);
        assert_eq!(session.history().len(), 2);
    }
}
