use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The article most recently fetched for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub source_url: String,
    pub title: String,
    pub raw_text: String,
    pub fetched_at: DateTime<Utc>,
}

impl Article {
    pub fn new(
        source_url: impl Into<String>,
        title: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            title: title.into(),
            raw_text: raw_text.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// A link collected from an article's References section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A canned answer. `question` is stored normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: &str, answer: impl Into<String>) -> Self {
        Self {
            question: crate::text::normalize_question(question),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Sniffs the format from the leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    pub prompt: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    /// Requests sent before the image arrived, 1 when no retry was needed.
    pub attempts: u32,
}
