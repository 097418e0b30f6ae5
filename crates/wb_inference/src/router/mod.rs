//! Question routing: an ordered chain of answering strategies.
//!
//! The router asks each strategy in turn and stops at the first one that
//! produces an answer. Which strategies take part, and in what order, is
//! configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use wb_core::config::RouterSettings;
use wb_core::text::normalize_question;
use wb_core::{Article, ConversationHistory, Error, ExternalAnswerer, Result, Session};

pub mod classifier;
pub mod faq;
pub mod strategies;

pub use classifier::{classify, QuestionKind};
pub use faq::FaqMatcher;
pub use strategies::{
    AnswerStrategy, ClarifyStrategy, ExternalStrategy, FaqStrategy, MentionStrategy, SearchStrategy,
    StrategyKind,
};

use crate::search::ArticleSearcher;

pub const EMPTY_QUESTION_REPLY: &str = "Please ask a question.";
pub const NO_ANSWER_REPLY: &str = "Sorry, I couldn't find an answer to that.";
pub const UNCATEGORIZED_REPLY: &str =
    "Sorry, I couldn't categorize that question. Try asking what, who, why or how.";
pub const APOLOGY_REPLY: &str =
    "Sorry, something went wrong while looking for an answer. Please try again.";

#[derive(Debug, Clone)]
pub struct Question {
    pub raw: String,
    pub normalized: String,
}

impl Question {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize_question(raw),
        }
    }
}

/// What a strategy may look at while answering.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub article: Option<&'a Article>,
    pub history: &'a ConversationHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Every question walks the whole chain.
    #[default]
    Priority,
    /// Questions are classified first. `Other` gets a fixed reply and
    /// `General` skips the article-bound strategies.
    Classified,
}

impl FromStr for RoutingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(RoutingPolicy::Priority),
            "classified" | "classifier" => Ok(RoutingPolicy::Classified),
            other => Err(Error::Config(format!(
                "unknown routing policy '{}', expected 'priority' or 'classified'",
                other
            ))),
        }
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingPolicy::Priority => write!(f, "priority"),
            RoutingPolicy::Classified => write!(f, "classified"),
        }
    }
}

enum Outcome {
    Answered(String),
    Failed(String),
}

#[derive(Debug)]
pub struct QuestionRouter {
    strategies: Vec<Box<dyn AnswerStrategy>>,
    policy: RoutingPolicy,
}

impl QuestionRouter {
    pub fn new(strategies: Vec<Box<dyn AnswerStrategy>>, policy: RoutingPolicy) -> Self {
        Self { strategies, policy }
    }

    /// Builds the chain named in `settings`. `answerer` is only required
    /// when the `external` strategy is part of it.
    pub fn from_settings(
        settings: &RouterSettings,
        answerer: Option<Arc<dyn ExternalAnswerer>>,
    ) -> Result<Self> {
        let policy: RoutingPolicy = settings.policy.parse()?;
        let mut strategies: Vec<Box<dyn AnswerStrategy>> =
            Vec::with_capacity(settings.strategies.len());

        for name in &settings.strategies {
            let strategy: Box<dyn AnswerStrategy> = match name.parse::<StrategyKind>()? {
                StrategyKind::Faq => {
                    let matcher = match &settings.faq_path {
                        Some(path) => FaqMatcher::from_json_file(path, settings.fuzzy_threshold)?,
                        None => FaqMatcher::with_defaults(settings.fuzzy_threshold),
                    };
                    Box::new(FaqStrategy::new(matcher))
                }
                StrategyKind::Clarify => Box::new(ClarifyStrategy),
                StrategyKind::Search => Box::new(SearchStrategy::new(ArticleSearcher::new(
                    settings.relevance_threshold,
                    settings.top_n,
                ))),
                StrategyKind::Mention => Box::new(MentionStrategy),
                StrategyKind::External => {
                    let answerer = answerer.clone().ok_or_else(|| {
                        Error::Config("the external strategy needs an answerer".to_string())
                    })?;
                    Box::new(ExternalStrategy::new(answerer, settings.context_chars))
                }
            };
            strategies.push(strategy);
        }

        Ok(Self::new(strategies, policy))
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Answers `question` against the session's article and records the
    /// exchange. Never fails: backend errors become an apology and are not
    /// recorded.
    pub async fn answer(&self, question: &str, session: &mut Session) -> String {
        let parsed = Question::new(question);
        if parsed.normalized.is_empty() {
            return EMPTY_QUESTION_REPLY.to_string();
        }

        let outcome = {
            let context = RouteContext {
                article: session.article(),
                history: session.history(),
            };
            self.route(&parsed, &context).await
        };

        match outcome {
            Outcome::Answered(answer) => {
                session.record(question.trim(), &answer);
                answer
            }
            Outcome::Failed(apology) => apology,
        }
    }

    async fn route(&self, question: &Question, context: &RouteContext<'_>) -> Outcome {
        let kind = match self.policy {
            RoutingPolicy::Priority => None,
            RoutingPolicy::Classified => Some(classify(&question.raw)),
        };
        if kind == Some(QuestionKind::Other) {
            tracing::debug!("Question could not be categorized");
            return Outcome::Answered(UNCATEGORIZED_REPLY.to_string());
        }

        for strategy in &self.strategies {
            let strategy_kind = strategy.kind();
            if kind == Some(QuestionKind::General) && strategy_kind.is_article_bound() {
                continue;
            }

            match strategy.attempt(question, context).await {
                Ok(Some(answer)) => {
                    tracing::info!("💬 Answered by {}", strategy_kind);
                    return Outcome::Answered(answer);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("⚠️ {} strategy failed: {}", strategy_kind, e);
                    return Outcome::Failed(apology(&e));
                }
            }
        }

        Outcome::Answered(NO_ANSWER_REPLY.to_string())
    }
}

fn apology(err: &Error) -> String {
    match err {
        Error::ExternalApi { .. } => err.user_message(),
        _ => APOLOGY_REPLY.to_string(),
    }
}
