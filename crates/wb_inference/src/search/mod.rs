//! Lexical relevance search over the sentences of an article.
//!
//! Sentences and the question form one small corpus; every document becomes
//! an L2-normalized TF-IDF vector and sentences are scored by cosine
//! similarity to the question.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use wb_core::text::split_sentences;
use wb_core::Article;

pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.1;
pub const DEFAULT_TOP_N: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "being", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
    "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "me", "more",
    "most", "my", "no", "not", "of", "on", "or", "other", "our", "she", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "to", "was", "we", "were", "what", "when", "where", "which", "who", "whom", "why", "will",
    "with", "would", "you", "your",
];

#[derive(Debug, Clone, PartialEq)]
pub struct RankedSentence {
    /// Position of the sentence in the article
    pub index: usize,
    pub sentence: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct ArticleSearcher {
    threshold: f32,
    top_n: usize,
    stop_words: HashSet<&'static str>,
}

impl ArticleSearcher {
    pub fn new(threshold: f32, top_n: usize) -> Self {
        Self {
            threshold,
            top_n,
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn rank(&self, question: &str, article: &Article) -> Vec<RankedSentence> {
        self.rank_text(question, &article.raw_text)
    }

    /// Best sentences first, at most `top_n`, each scoring strictly above
    /// the threshold. Equal scores keep article order.
    pub fn rank_text(&self, question: &str, text: &str) -> Vec<RankedSentence> {
        let sentences = split_sentences(text);
        if sentences.is_empty() || self.top_n == 0 {
            return Vec::new();
        }

        let mut documents: Vec<Vec<String>> = sentences.iter().map(|s| self.tokenize(s)).collect();
        documents.push(self.tokenize(question));

        let vectors = tfidf_vectors(&documents);
        let (query, sentence_vectors) = match vectors.split_last() {
            Some(split) => split,
            None => return Vec::new(),
        };
        if query.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<RankedSentence> = sentence_vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| RankedSentence {
                index,
                sentence: sentences[index].to_string(),
                score: cosine_similarity(query, vector),
            })
            .filter(|r| r.score > self.threshold)
            .collect();

        // `sort_by` is stable, so ties stay in article order.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(self.top_n);

        tracing::debug!(
            "Ranked {} sentences, {} above {:.2}",
            sentences.len(),
            ranked.len(),
            self.threshold
        );
        ranked
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !self.stop_words.contains(t.as_str()))
            .collect()
    }
}

impl Default for ArticleSearcher {
    fn default() -> Self {
        Self::new(DEFAULT_RELEVANCE_THRESHOLD, DEFAULT_TOP_N)
    }
}

type SparseVector = HashMap<String, f32>;

/// Raw term counts weighted by smoothed idf `ln((1 + n) / (1 + df)) + 1`,
/// then L2-normalized.
fn tfidf_vectors(documents: &[Vec<String>]) -> Vec<SparseVector> {
    let n = documents.len() as f32;

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for doc in documents {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    documents
        .iter()
        .map(|doc| {
            let mut vector: SparseVector = HashMap::new();
            for term in doc {
                *vector.entry(term.clone()).or_insert(0.0) += 1.0;
            }
            for (term, weight) in vector.iter_mut() {
                let df = document_frequency.get(term.as_str()).copied().unwrap_or(0) as f32;
                *weight *= ((1.0 + n) / (1.0 + df)).ln() + 1.0;
            }
            let norm = vector.values().map(|w| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                vector.values_mut().for_each(|w| *w /= norm);
            }
            vector
        })
        .collect()
}

/// Both inputs are unit vectors, so the dot product is the cosine.
fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Statistics is the discipline that concerns the collection of data. \
        Bayesian inference updates beliefs with evidence. \
        The weather was pleasant yesterday. \
        Thomas Bayes formulated a theorem on conditional probability. \
        Descriptive statistics summarize data from a sample.";

    #[test]
    fn test_rank_finds_relevant_sentence() {
        let searcher = ArticleSearcher::default();
        let ranked = searcher.rank_text("Who was Thomas Bayes?", TEXT);
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].index, 3);
        assert!(ranked[0].sentence.starts_with("Thomas Bayes"));
    }

    #[test]
    fn test_rank_respects_threshold_order_and_top_n() {
        let searcher = ArticleSearcher::new(0.1, 2);
        let ranked = searcher.rank_text("statistics data collection", TEXT);
        assert!(ranked.len() <= 2);
        assert!(ranked.iter().all(|r| r.score > 0.1));
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(ranked.iter().all(|r| r.index != 2));
    }

    #[test]
    fn test_ties_keep_article_order() {
        let text = "Rust is fast. Go is simple. Rust is safe.";
        let ranked = ArticleSearcher::new(0.0, 3).rank_text("rust", text);
        assert_eq!(ranked.len(), 2);
        assert!((ranked[0].score - ranked[1].score).abs() < 1e-6);
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[1].index, 2);
    }

    #[test]
    fn test_no_match_returns_nothing() {
        let searcher = ArticleSearcher::default();
        assert!(searcher.rank_text("volcano eruption", TEXT).is_empty());
        assert!(searcher.rank_text("what is the", TEXT).is_empty());
        assert!(searcher.rank_text("statistics", "").is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let text = "Alpha beta. Gamma delta.";
        let exact = ArticleSearcher::new(0.0, 3).rank_text("alpha beta", text);
        assert_eq!(exact.len(), 1);
        let score = exact[0].score;
        assert!(ArticleSearcher::new(score, 3).rank_text("alpha beta", text).is_empty());
    }

    #[test]
    fn test_cited_sentences_rank_whole() {
        let text = "Statistics concerns data.[1] Bayesian inference updates beliefs.[2][3] \
                    The weather was pleasant.[4]";
        let ranked = ArticleSearcher::new(0.0, 3).rank_text("bayesian inference", text);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].index, 1);
        assert_eq!(ranked[0].sentence, "Bayesian inference updates beliefs.[2][3]");
    }

    #[test]
    fn test_rank_article() {
        let article = Article::new("https://en.wikipedia.org/wiki/Statistics", "Statistics", TEXT);
        let ranked = ArticleSearcher::default().rank("descriptive statistics sample", &article);
        assert_eq!(ranked[0].index, 4);
    }
}
