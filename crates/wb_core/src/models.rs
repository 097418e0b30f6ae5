use async_trait::async_trait;
use std::fmt;

use crate::Result;

/// A hosted service that answers free-text questions.
#[async_trait]
pub trait ExternalAnswerer: Send + Sync + fmt::Debug {
    /// Short name used in logs and user-facing error messages
    fn name(&self) -> &str;

    /// Answers `question`, optionally grounded on `context` (article text).
    async fn answer(&self, question: &str, context: Option<&str>) -> Result<String>;
}

/// Raw reply from an image-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ImageResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
    }
}

/// Transport for image generation. `generate` posts a prompt, `download`
/// fetches an image the provider only linked to.
#[async_trait]
pub trait ImageBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<ImageResponse>;

    async fn download(&self, url: &str) -> Result<ImageResponse>;
}
