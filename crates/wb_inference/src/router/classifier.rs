use std::fmt;

const FACTUAL_KEYWORDS: &[&str] = &[
    "what", "who", "when", "where", "which", "how many", "how much", "define", "definition",
];

const GENERAL_KEYWORDS: &[&str] = &[
    "why", "how", "explain", "describe", "tell me", "opinion", "think", "should",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Factual,
    General,
    Other,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Factual => write!(f, "factual"),
            QuestionKind::General => write!(f, "general"),
            QuestionKind::Other => write!(f, "other"),
        }
    }
}

/// Keyword containment on the lowercased question. Factual keywords are
/// checked first, so they win when both sets match.
pub fn classify(question: &str) -> QuestionKind {
    let lower = question.to_lowercase();
    if FACTUAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        QuestionKind::Factual
    } else if GENERAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        QuestionKind::General
    } else {
        QuestionKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("What is statistics?"), QuestionKind::Factual);
        assert_eq!(classify("Who founded the field?"), QuestionKind::Factual);
        assert_eq!(classify("Explain regression to me"), QuestionKind::General);
        assert_eq!(classify("Why does variance matter?"), QuestionKind::General);
        assert_eq!(classify("hello there"), QuestionKind::Other);
    }

    #[test]
    fn test_factual_wins_over_general() {
        assert_eq!(classify("Why is the mean what it is?"), QuestionKind::Factual);
        assert_eq!(classify("How many samples do I need?"), QuestionKind::Factual);
    }
}
