use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use wb_core::text::truncate_chars;
use wb_core::{Error, ExternalAnswerer, Result};

use super::faq::FaqMatcher;
use super::{Question, RouteContext};
use crate::search::ArticleSearcher;

pub const CLARIFICATION_PHRASES: &[&str] =
    &["could you elaborate", "what do you mean", "please clarify"];
pub const CLARIFICATION_PROMPT: &str =
    "Could you please provide more details or rephrase your question so I can help?";

/// One link of the answering chain.
#[async_trait]
pub trait AnswerStrategy: Send + Sync + fmt::Debug {
    fn kind(&self) -> StrategyKind;

    /// `Ok(None)` hands the question to the next strategy.
    async fn attempt(
        &self,
        question: &Question,
        context: &RouteContext<'_>,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Faq,
    Clarify,
    Search,
    Mention,
    External,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Faq,
        StrategyKind::Clarify,
        StrategyKind::Search,
        StrategyKind::Mention,
        StrategyKind::External,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Faq => "faq",
            StrategyKind::Clarify => "clarify",
            StrategyKind::Search => "search",
            StrategyKind::Mention => "mention",
            StrategyKind::External => "external",
        }
    }

    /// Strategies that only make sense for questions about the loaded article.
    pub fn is_article_bound(&self) -> bool {
        matches!(self, StrategyKind::Search | StrategyKind::Mention)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                Error::Config(format!(
                    "unknown strategy '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

#[derive(Debug)]
pub struct FaqStrategy {
    matcher: FaqMatcher,
}

impl FaqStrategy {
    pub fn new(matcher: FaqMatcher) -> Self {
        Self { matcher }
    }
}

#[async_trait]
impl AnswerStrategy for FaqStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Faq
    }

    async fn attempt(
        &self,
        question: &Question,
        _context: &RouteContext<'_>,
    ) -> Result<Option<String>> {
        Ok(self.matcher.lookup(&question.normalized).map(|e| e.answer.clone()))
    }
}

#[derive(Debug, Default)]
pub struct ClarifyStrategy;

#[async_trait]
impl AnswerStrategy for ClarifyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Clarify
    }

    async fn attempt(
        &self,
        question: &Question,
        _context: &RouteContext<'_>,
    ) -> Result<Option<String>> {
        let asks_for_clarification = CLARIFICATION_PHRASES
            .iter()
            .any(|phrase| question.normalized.contains(phrase));
        Ok(asks_for_clarification.then(|| CLARIFICATION_PROMPT.to_string()))
    }
}

#[derive(Debug)]
pub struct SearchStrategy {
    searcher: ArticleSearcher,
}

impl SearchStrategy {
    pub fn new(searcher: ArticleSearcher) -> Self {
        Self { searcher }
    }
}

#[async_trait]
impl AnswerStrategy for SearchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Search
    }

    async fn attempt(
        &self,
        question: &Question,
        context: &RouteContext<'_>,
    ) -> Result<Option<String>> {
        let article = match context.article {
            Some(article) => article,
            None => return Ok(None),
        };

        let ranked = self.searcher.rank(&question.raw, article);
        if ranked.is_empty() {
            return Ok(None);
        }

        let sentences: Vec<&str> = ranked.iter().map(|r| r.sentence.as_str()).collect();
        Ok(Some(format!("From the article: {}", sentences.join(" "))))
    }
}

/// Verbatim containment of the question in the article text.
#[derive(Debug, Default)]
pub struct MentionStrategy;

#[async_trait]
impl AnswerStrategy for MentionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Mention
    }

    async fn attempt(
        &self,
        question: &Question,
        context: &RouteContext<'_>,
    ) -> Result<Option<String>> {
        let article = match context.article {
            Some(article) if !question.normalized.is_empty() => article,
            _ => return Ok(None),
        };

        let mentioned = article
            .raw_text
            .to_lowercase()
            .contains(&question.raw.trim().to_lowercase());
        Ok(mentioned.then(|| format!("From the article: '{}' is mentioned.", question.raw.trim())))
    }
}

#[derive(Debug)]
pub struct ExternalStrategy {
    answerer: Arc<dyn ExternalAnswerer>,
    context_chars: usize,
}

impl ExternalStrategy {
    pub fn new(answerer: Arc<dyn ExternalAnswerer>, context_chars: usize) -> Self {
        Self { answerer, context_chars }
    }
}

#[async_trait]
impl AnswerStrategy for ExternalStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::External
    }

    async fn attempt(
        &self,
        question: &Question,
        context: &RouteContext<'_>,
    ) -> Result<Option<String>> {
        let article_context = context
            .article
            .map(|a| truncate_chars(&a.raw_text, self.context_chars))
            .filter(|text| !text.trim().is_empty());

        tracing::debug!(
            "Asking {} (context: {} chars)",
            self.answerer.name(),
            article_context.map(|c| c.len()).unwrap_or(0)
        );
        let answer = self.answerer.answer(question.raw.trim(), article_context).await?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }
}
