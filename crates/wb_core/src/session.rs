use crate::history::ConversationHistory;
use crate::types::{Article, ConversationEntry};

/// Per-user state: the current article and the conversation so far.
/// Owned by whoever drives the conversation and lent to the router.
#[derive(Debug, Clone, Default)]
pub struct Session {
    article: Option<Article>,
    history: ConversationHistory,
}

impl Session {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            article: None,
            history: ConversationHistory::new(history_capacity),
        }
    }

    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    /// Replaces the current article. Last write wins.
    pub fn set_article(&mut self, article: Article) -> Option<Article> {
        self.article.replace(article)
    }

    /// Drops the current article. History is kept.
    pub fn clear_article(&mut self) -> Option<Article> {
        self.article.take()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn record(&mut self, question: &str, answer: &str) {
        self.history.push(ConversationEntry::new(question, answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_article_wins() {
        let mut session = Session::new(5);
        assert!(session.article().is_none());

        session.set_article(Article::new("https://a", "A", "first"));
        let previous = session.set_article(Article::new("https://b", "B", "second"));

        assert_eq!(previous.unwrap().source_url, "https://a");
        assert_eq!(session.article().unwrap().raw_text, "second");
        assert!(session.clear_article().is_some());
        assert!(session.article().is_none());
    }

    #[test]
    fn test_record_appends_to_history() {
        let mut session = Session::new(1);
        session.record("q1", "a1");
        session.record("q2", "a2");
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().last().unwrap().question, "q2");
    }
}
