use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_ARTICLE_URL: &str = "https://en.wikipedia.org/wiki/Statistics";
pub const DEFAULT_QA_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/deepset/roberta-base-squad2";
pub const DEFAULT_IMAGE_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2-1";
pub const WIT_TOKEN_VAR: &str = "WIT_ACCESS_TOKEN";
pub const HF_TOKEN_VAR: &str = "HF_API_TOKEN";

#[derive(Clone, Debug)]
pub struct RouterSettings {
    /// Strategy names in the order they are tried
    pub strategies: Vec<String>,
    pub policy: String,
    pub fuzzy_threshold: f64,
    pub relevance_threshold: f32,
    pub top_n: usize,
    pub context_chars: usize,
    pub faq_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ImageSettings {
    pub model_url: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub cache_capacity: usize,
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub wit_access_token: Option<String>,
    pub hf_api_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("wit_access_token", &self.wit_access_token.as_deref().map(|_| "<redacted>"))
            .field("hf_api_token", &self.hf_api_token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn wit(&self) -> Result<String> {
        require(WIT_TOKEN_VAR, self.wit_access_token.as_deref())
    }

    pub fn hugging_face(&self) -> Result<String> {
        require(HF_TOKEN_VAR, self.hf_api_token.as_deref())
    }
}

fn require(name: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(Error::MissingCredential(name.to_string())),
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub summary_sentences: usize,
    pub history_capacity: usize,
    pub http_timeout: Duration,
    pub answerer: String,
    pub qa_model_url: String,
    pub router: RouterSettings,
    pub image: ImageSettings,
    pub credentials: Credentials,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            summary_sentences: parse_or(&lookup, "WIKIBOT_SUMMARY_SENTENCES", 10usize),
            history_capacity: parse_or(
                &lookup,
                "WIKIBOT_HISTORY_CAPACITY",
                crate::history::DEFAULT_HISTORY_CAPACITY,
            ),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "WIKIBOT_HTTP_TIMEOUT_SECS",
                30u64,
            )),
            answerer: lookup("WIKIBOT_ANSWERER").unwrap_or_else(|| "wit".to_string()),
            qa_model_url: lookup("HF_QA_MODEL_URL")
                .unwrap_or_else(|| DEFAULT_QA_MODEL_URL.to_string()),
            router: RouterSettings {
                strategies: lookup("WIKIBOT_STRATEGIES")
                    .map(|v| split_list(&v))
                    .unwrap_or_else(|| {
                        ["faq", "clarify", "search", "external"]
                            .iter()
                            .map(|s| s.to_string())
                            .collect()
                    }),
                policy: lookup("WIKIBOT_ROUTING_POLICY").unwrap_or_else(|| "priority".to_string()),
                fuzzy_threshold: parse_or(&lookup, "WIKIBOT_FUZZY_THRESHOLD", 70.0f64),
                relevance_threshold: parse_or(&lookup, "WIKIBOT_RELEVANCE_THRESHOLD", 0.1f32),
                top_n: parse_or(&lookup, "WIKIBOT_TOP_N", 3usize),
                context_chars: parse_or(&lookup, "WIKIBOT_CONTEXT_CHARS", 4_000usize),
                faq_path: lookup("WIKIBOT_FAQ_PATH").map(PathBuf::from),
            },
            image: ImageSettings {
                model_url: lookup("HF_IMAGE_MODEL_URL")
                    .unwrap_or_else(|| DEFAULT_IMAGE_MODEL_URL.to_string()),
                max_attempts: parse_or(&lookup, "WIKIBOT_IMAGE_MAX_ATTEMPTS", 3u32),
                retry_delay: Duration::from_secs(parse_or(
                    &lookup,
                    "WIKIBOT_IMAGE_RETRY_SECS",
                    30u64,
                )),
                cache_capacity: parse_or(&lookup, "WIKIBOT_IMAGE_CACHE_CAPACITY", 16usize),
            },
            credentials: Credentials {
                wit_access_token: lookup(WIT_TOKEN_VAR),
                hf_api_token: lookup(HF_TOKEN_VAR),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
