//! Image generation through a hosted text-to-image model.
//!
//! A request runs as an explicit state machine:
//!
//! ```text
//! Requesting(n) --image--------------------> Done
//! Requesting(n) --image link---------------> Downloading --image--> Done
//! Requesting(n) --503 loading, n < max-----> Retrying(n) --delay--> Requesting(n + 1)
//! Requesting(n) --503 loading, n == max----> Failed(RetriesExhausted)
//! Requesting(n) --anything else------------> Failed
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use serde_json::Value;
use wb_core::config::ImageSettings;
use wb_core::{http, ImageBackend, ImageFormat, ImageResponse, ImageResult, Result};

pub mod cache;
pub mod huggingface;

pub use cache::ImageCache;
pub use huggingface::HuggingFaceImageBackend;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total requests allowed, including the first one
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    EmptyPrompt,
    RetriesExhausted { attempts: u32 },
    UnexpectedStatus { status: u16, message: String },
    NotAnImage(String),
    Transport(String),
}

impl GenerationFailure {
    pub fn user_message(&self) -> String {
        match self {
            GenerationFailure::EmptyPrompt => "Please describe the image you want.".to_string(),
            GenerationFailure::RetriesExhausted { attempts } => format!(
                "Sorry, the image model is still loading after {} attempts. \
                 Please try again later.",
                attempts
            ),
            GenerationFailure::UnexpectedStatus { status, .. } => {
                format!("Sorry, the image service returned an error ({}).", status)
            }
            GenerationFailure::NotAnImage(_) => {
                "Sorry, the image service did not send back an image.".to_string()
            }
            GenerationFailure::Transport(_) => {
                "Sorry, the image service could not be reached.".to_string()
            }
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::EmptyPrompt => write!(f, "empty prompt"),
            GenerationFailure::RetriesExhausted { attempts } => {
                write!(f, "model still loading after {} attempts", attempts)
            }
            GenerationFailure::UnexpectedStatus { status, message } => {
                write!(f, "unexpected status {}: {}", status, message)
            }
            GenerationFailure::NotAnImage(detail) => write!(f, "not an image: {}", detail),
            GenerationFailure::Transport(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Requesting { attempt: u32 },
    Retrying { attempt: u32 },
    Downloading { url: String, attempt: u32 },
    Done(ImageResult),
    Failed(GenerationFailure),
}

impl GenerationState {
    pub fn start() -> Self {
        GenerationState::Requesting { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationState::Done(_) | GenerationState::Failed(_))
    }

    /// Advances on the reply to the request made in this state.
    pub fn on_response(
        self,
        prompt: &str,
        response: Result<ImageResponse>,
        policy: &RetryPolicy,
    ) -> Self {
        let (attempt, downloading) = match self {
            GenerationState::Requesting { attempt } => (attempt, false),
            GenerationState::Downloading { attempt, .. } => (attempt, true),
            other => return other,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return GenerationState::Failed(GenerationFailure::Transport(e.to_string())),
        };

        match interpret(&response) {
            Payload::Image(bytes, format) => GenerationState::Done(ImageResult {
                prompt: prompt.to_string(),
                bytes,
                format,
                attempts: attempt,
            }),
            Payload::Link(url) if !downloading => GenerationState::Downloading { url, attempt },
            Payload::Link(url) => GenerationState::Failed(GenerationFailure::NotAnImage(format!(
                "download pointed to another link: {}",
                url
            ))),
            Payload::Loading if downloading => {
                GenerationState::Failed(GenerationFailure::UnexpectedStatus {
                    status: response.status,
                    message: http::error_body(&String::from_utf8_lossy(&response.body)),
                })
            }
            Payload::Loading if attempt < policy.max_attempts => {
                GenerationState::Retrying { attempt }
            }
            Payload::Loading => {
                GenerationState::Failed(GenerationFailure::RetriesExhausted { attempts: attempt })
            }
            Payload::Rejected(failure) => GenerationState::Failed(failure),
        }
    }

    /// Leaves `Retrying` once the delay has passed.
    pub fn resume(self) -> Self {
        match self {
            GenerationState::Retrying { attempt } => {
                GenerationState::Requesting { attempt: attempt + 1 }
            }
            other => other,
        }
    }
}

enum Payload {
    Image(Vec<u8>, ImageFormat),
    Link(String),
    Loading,
    Rejected(GenerationFailure),
}

const LOADING_STATUS: u16 = 503;
const BASE64_FIELDS: &[&str] = &["/image", "/b64_json", "/data/0/b64_json", "/images/0"];
const URL_FIELDS: &[&str] = &["/url", "/image_url", "/data/0/url"];

fn interpret(response: &ImageResponse) -> Payload {
    if response.status == LOADING_STATUS {
        return Payload::Loading;
    }
    if !(200..300).contains(&response.status) {
        return Payload::Rejected(GenerationFailure::UnexpectedStatus {
            status: response.status,
            message: http::error_body(&String::from_utf8_lossy(&response.body)),
        });
    }

    if let Some(format) = ImageFormat::detect(&response.body) {
        return Payload::Image(response.body.clone(), format);
    }

    let json: Value = match serde_json::from_slice(&response.body) {
        Ok(json) => json,
        Err(_) => {
            return Payload::Rejected(GenerationFailure::NotAnImage(format!(
                "{} byte body of type {}",
                response.body.len(),
                response.content_type.as_deref().unwrap_or("unknown")
            )))
        }
    };

    let encoded = BASE64_FIELDS
        .iter()
        .find_map(|p| json.pointer(p).and_then(Value::as_str));
    if let Some(encoded) = encoded {
        return match decode_base64_image(encoded) {
            Some((bytes, format)) => Payload::Image(bytes, format),
            None => Payload::Rejected(GenerationFailure::NotAnImage(
                "base64 payload is not a known image format".to_string(),
            )),
        };
    }

    if let Some(url) = URL_FIELDS.iter().find_map(|p| json.pointer(p).and_then(Value::as_str)) {
        return Payload::Link(url.to_string());
    }

    Payload::Rejected(GenerationFailure::NotAnImage(
        "JSON response carried no image".to_string(),
    ))
}

/// Accepts bare base64 or a `data:image/...;base64,` URI.
fn decode_base64_image(encoded: &str) -> Option<(Vec<u8>, ImageFormat)> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    let format = ImageFormat::detect(&bytes)?;
    Some((bytes, format))
}

#[derive(Debug, Clone)]
pub struct ImageGenerator {
    backend: Arc<dyn ImageBackend>,
    policy: RetryPolicy,
    cache: Arc<Mutex<ImageCache>>,
}

impl ImageGenerator {
    pub fn new(backend: Arc<dyn ImageBackend>, policy: RetryPolicy, cache_capacity: usize) -> Self {
        Self {
            backend,
            policy,
            cache: Arc::new(Mutex::new(ImageCache::new(cache_capacity))),
        }
    }

    /// Hugging Face backed generator. Needs the HF token.
    pub fn from_settings(
        settings: &ImageSettings,
        credentials: &wb_core::config::Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let token = credentials.hugging_face()?;
        let backend =
            HuggingFaceImageBackend::new(http::client(timeout)?, token, settings.model_url.clone());
        Ok(Self::new(
            Arc::new(backend),
            RetryPolicy::new(settings.max_attempts, settings.retry_delay),
            settings.cache_capacity,
        ))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn generate(
        &self,
        prompt: &str,
    ) -> std::result::Result<ImageResult, GenerationFailure> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationFailure::EmptyPrompt);
        }

        if let Some(hit) = self.cached(prompt) {
            tracing::info!("🖼️ Serving cached image for '{}'", prompt);
            return Ok(hit);
        }

        let mut state = GenerationState::start();
        loop {
            state = match state {
                GenerationState::Requesting { attempt } => {
                    tracing::info!(
                        "🎨 Requesting image from {} (attempt {}/{})",
                        self.backend.name(),
                        attempt,
                        self.policy.max_attempts
                    );
                    let response = self.backend.generate(prompt).await;
                    GenerationState::Requesting { attempt }
                        .on_response(prompt, response, &self.policy)
                }
                GenerationState::Downloading { url, attempt } => {
                    tracing::info!("⬇️ Downloading generated image from {}", url);
                    let response = self.backend.download(&url).await;
                    GenerationState::Downloading { url, attempt }
                        .on_response(prompt, response, &self.policy)
                }
                GenerationState::Retrying { attempt } => {
                    tracing::warn!(
                        "⏳ Image model is loading, retrying in {}s",
                        self.policy.delay.as_secs()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    GenerationState::Retrying { attempt }.resume()
                }
                GenerationState::Done(image) => {
                    tracing::info!("✨ Image generated after {} attempt(s)", image.attempts);
                    self.store(&image);
                    return Ok(image);
                }
                GenerationState::Failed(failure) => {
                    tracing::error!("❌ Image generation failed: {}", failure);
                    return Err(failure);
                }
            };
        }
    }

    fn cached(&self, prompt: &str) -> Option<ImageResult> {
        match self.cache.lock() {
            Ok(mut cache) => cache.get(prompt),
            Err(_) => None,
        }
    }

    fn store(&self, image: &ImageResult) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(image.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wb_core::Error;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn loading() -> ImageResponse {
        ImageResponse::new(
            503,
            Some("application/json"),
            r#"{"error":"Model is currently loading","estimated_time":20.0}"#,
        )
    }

    fn png() -> ImageResponse {
        ImageResponse::new(200, Some("image/png"), PNG)
    }

    #[derive(Debug, Default)]
    struct ScriptedBackend {
        generate: Mutex<VecDeque<ImageResponse>>,
        download: Mutex<VecDeque<ImageResponse>>,
        generate_calls: AtomicUsize,
        download_calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(generate: Vec<ImageResponse>) -> Self {
            Self {
                generate: Mutex::new(generate.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ImageBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str) -> Result<ImageResponse> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.generate
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::external_api("scripted", None, "connection refused"))
        }

        async fn download(&self, _url: &str) -> Result<ImageResponse> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);
            self.download
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::external_api("scripted", None, "connection refused"))
        }
    }

    fn generator(backend: Arc<ScriptedBackend>, cache_capacity: usize) -> ImageGenerator {
        ImageGenerator::new(backend, RetryPolicy::new(3, Duration::ZERO), cache_capacity)
    }

    #[tokio::test]
    async fn test_two_loading_replies_then_image() {
        let backend = Arc::new(ScriptedBackend::new(vec![loading(), loading(), png()]));
        let image = generator(backend.clone(), 0).generate("a red fox").await.unwrap();

        assert_eq!(image.attempts, 3);
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.bytes, PNG);
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let backend = Arc::new(ScriptedBackend::new(vec![loading(), loading(), loading(), png()]));
        let failure = generator(backend.clone(), 0).generate("a red fox").await.unwrap_err();

        assert_eq!(failure, GenerationFailure::RetriesExhausted { attempts: 3 });
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 3);
        assert!(failure.user_message().contains("3 attempts"));
    }

    #[tokio::test]
    async fn test_other_status_fails_without_retry() {
        let backend = Arc::new(ScriptedBackend::new(vec![ImageResponse::new(
            401,
            Some("application/json"),
            r#"{"error":"Invalid token"}"#,
        )]));
        let failure = generator(backend.clone(), 0).generate("a red fox").await.unwrap_err();

        assert_eq!(
            failure,
            GenerationFailure::UnexpectedStatus {
                status: 401,
                message: "Invalid token".to_string()
            }
        );
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ok_without_image_fails() {
        let backend = Arc::new(ScriptedBackend::new(vec![ImageResponse::new(
            200,
            Some("text/html"),
            "<html>maintenance</html>",
        )]));
        let failure = generator(backend, 0).generate("a red fox").await.unwrap_err();
        assert!(matches!(failure, GenerationFailure::NotAnImage(_)));
    }

    #[tokio::test]
    async fn test_transport_error_fails() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let failure = generator(backend, 0).generate("a red fox").await.unwrap_err();
        assert!(matches!(failure, GenerationFailure::Transport(_)));
    }

    #[tokio::test]
    async fn test_base64_and_link_payloads() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PNG);
        let body = format!(r#"{{"data":[{{"b64_json":"data:image/png;base64,{}"}}]}}"#, encoded);
        let response = ImageResponse::new(200, Some("application/json"), body);
        let backend = Arc::new(ScriptedBackend::new(vec![response]));
        let image = generator(backend, 0).generate("a red fox").await.unwrap();
        assert_eq!(image.bytes, PNG);

        let backend = Arc::new(ScriptedBackend::new(vec![ImageResponse::new(
            200,
            Some("application/json"),
            r#"{"url":"https://cdn.example/fox.png"}"#,
        )]));
        backend.download.lock().unwrap().push_back(png());
        let image = generator(backend.clone(), 0).generate("a red fox").await.unwrap();
        assert_eq!(image.attempts, 1);
        assert_eq!(backend.download_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_serves_repeated_prompt() {
        let backend = Arc::new(ScriptedBackend::new(vec![png()]));
        let generator = generator(backend.clone(), 4);

        generator.generate("A red fox").await.unwrap();
        let again = generator.generate("a red   fox").await.unwrap();

        assert_eq!(again.bytes, PNG);
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt() {
        let backend = Arc::new(ScriptedBackend::new(vec![png()]));
        let failure = generator(backend.clone(), 0).generate("   ").await.unwrap_err();
        assert_eq!(failure, GenerationFailure::EmptyPrompt);
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_state_transitions() {
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let state = GenerationState::start().on_response("p", Ok(loading()), &policy);
        assert_eq!(state, GenerationState::Retrying { attempt: 1 });
        assert!(!state.is_terminal());

        let state = state.resume();
        assert_eq!(state, GenerationState::Requesting { attempt: 2 });

        let state = state.on_response("p", Ok(loading()), &policy);
        assert_eq!(
            state,
            GenerationState::Failed(GenerationFailure::RetriesExhausted { attempts: 2 })
        );
        assert!(state.is_terminal());

        // Terminal states ignore further input.
        let state = state.on_response("p", Ok(png()), &policy);
        assert!(matches!(state, GenerationState::Failed(_)));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
