use std::collections::BTreeMap;
use std::path::Path;

use wb_core::text::normalize_question;
use wb_core::{FaqEntry, Result};

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 70.0;

/// Exact-then-fuzzy lookup over a fixed table of canned answers.
#[derive(Debug, Clone)]
pub struct FaqMatcher {
    entries: Vec<FaqEntry>,
    threshold: f64,
}

impl FaqMatcher {
    pub fn new(entries: Vec<FaqEntry>, threshold: f64) -> Self {
        Self { entries, threshold }
    }

    pub fn with_defaults(threshold: f64) -> Self {
        Self::new(default_entries(), threshold)
    }

    /// Reads a JSON object of `{"question": "answer"}` pairs.
    pub fn from_json_file(path: &Path, threshold: f64) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        let entries = table
            .into_iter()
            .map(|(question, answer)| FaqEntry::new(&question, answer))
            .collect();
        Ok(Self::new(entries, threshold))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `question` must already be normalized.
    pub fn lookup(&self, question: &str) -> Option<&FaqEntry> {
        if let Some(entry) = self.entries.iter().find(|e| e.question == question) {
            return Some(entry);
        }

        self.entries
            .iter()
            .map(|e| (e, similarity(question, &e.question)))
            .filter(|(_, score)| *score >= self.threshold)
            .fold(None, |best: Option<(&FaqEntry, f64)>, (entry, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((entry, score)),
            })
            .map(|(entry, score)| {
                tracing::debug!("FAQ fuzzy match '{}' ({:.0})", entry.question, score);
                entry
            })
    }
}

/// Edit-distance similarity on a 0-100 scale.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

pub fn default_entries() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            "What is statistics?",
            "Statistics is the discipline that concerns the collection, organization, analysis, \
             interpretation, and presentation of data.",
        ),
        FaqEntry::new(
            "What is Wikipedia?",
            "Wikipedia is a free online encyclopedia written and maintained \
             by a community of volunteers.",
        ),
        FaqEntry::new(
            "What can you do?",
            "I can summarize a Wikipedia article, list its references and images, answer questions \
             about it, and generate images from a prompt.",
        ),
        FaqEntry::new(
            "How do I load an article?",
            "Give me a Wikipedia URL to analyze, then ask your questions about it.",
        ),
    ]
}
