use wb_core::text::split_sentences;

pub const DEFAULT_SUMMARY_SENTENCES: usize = 10;

/// Extractive summary: the first `sentences` sentences, verbatim.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer {
    sentences: usize,
}

impl Summarizer {
    pub fn new(sentences: usize) -> Self {
        Self { sentences }
    }

    pub fn sentences(&self) -> usize {
        self.sentences
    }

    /// Texts shorter than the limit come back whole and untouched.
    pub fn summarize(&self, text: &str) -> String {
        let sentences = split_sentences(text);
        if sentences.len() < self.sentences {
            return text.to_string();
        }
        sentences[..self.sentences].join(" ")
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_SENTENCES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takes_first_k_sentences() {
        let text = "One is first. Two is second.\nThree is third! Four is fourth? Five.";
        let summary = Summarizer::new(3).summarize(text);
        assert_eq!(summary, "One is first. Two is second. Three is third!");
    }

    #[test]
    fn test_exactly_k_sentences_are_joined() {
        let text = "Alpha.\nBeta.";
        assert_eq!(Summarizer::new(2).summarize(text), "Alpha. Beta.");
    }

    #[test]
    fn test_short_text_is_returned_whole() {
        let text = "Only one sentence here.\n";
        assert_eq!(Summarizer::new(10).summarize(text), text);
        assert_eq!(Summarizer::default().summarize(""), "");
    }

    #[test]
    fn test_citations_stay_with_their_sentence() {
        let text = "Statistics concerns data.[1][2] Populations can be diverse.[3] \
                    In contrast, an observational study does not.[4]";
        assert_eq!(
            Summarizer::new(2).summarize(text),
            "Statistics is the discipline that concerns data.[1][2] Populations can be diverse.[3]"
        );
    }

    #[test]
    fn test_ten_sentence_default() {
        let text: String = (1..=12).map(|n| format!("Sentence number {}. ", n)).collect();
        let summary = Summarizer::default().summarize(&text);
        assert!(summary.starts_with("Sentence number 1."));
        assert!(summary.ends_with("Sentence number 10."));
        assert!(!summary.contains("Sentence number 11."));
    }
}
