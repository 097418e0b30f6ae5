use std::sync::Arc;

use wb_core::{http, Error, ExternalAnswerer, Result};

use crate::Config;

pub mod dummy;
pub mod huggingface;
pub mod wit;

pub use dummy::DummyAnswerer;
pub use huggingface::HuggingFaceAnswerer;
pub use wit::WitAnswerer;

/// Names accepted by `create_answerer`.
pub const AVAILABLE_ANSWERERS: &[&str] = &["wit", "huggingface", "dummy"];

/// Builds the configured answerer. Fails with `MissingCredential` when the
/// chosen backend needs a token that is not set.
pub fn create_answerer(config: &Config) -> Result<Arc<dyn ExternalAnswerer>> {
    let name = config.answerer.trim().to_lowercase();
    let answerer: Arc<dyn ExternalAnswerer> = match name.as_str() {
        "wit" | "wit.ai" => {
            let token = config.credentials.wit()?;
            Arc::new(WitAnswerer::new(http::client(config.timeout)?, token))
        }
        "huggingface" | "hf" => {
            let token = config.credentials.hugging_face()?;
            Arc::new(HuggingFaceAnswerer::new(
                http::client(config.timeout)?,
                token,
                config.qa_model_url.clone(),
            ))
        }
        "dummy" => Arc::new(DummyAnswerer::new()),
        other => {
            return Err(Error::Config(format!(
                "unknown answerer '{}', expected one of: {}",
                other,
                AVAILABLE_ANSWERERS.join(", ")
            )))
        }
    };

    tracing::debug!("Using {} as external answerer", answerer.name());
    Ok(answerer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wb_core::config::Credentials;
    use wb_core::AppConfig;

    fn config(answerer: &str, credentials: Credentials) -> Config {
        let mut app = AppConfig::default();
        app.answerer = answerer.to_string();
        app.credentials = credentials;
        Config::from_app(&app)
    }

    #[test]
    fn test_create_dummy_answerer() {
        let answerer = create_answerer(&config("dummy", Credentials::default())).unwrap();
        assert_eq!(answerer.name(), "Dummy");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = create_answerer(&config("wit", Credentials::default())).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));

        let err = create_answerer(&config("huggingface", Credentials::default())).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[test]
    fn test_create_with_tokens() {
        let credentials = Credentials {
            wit_access_token: Some("w".to_string()),
            hf_api_token: Some("h".to_string()),
        };
        assert_eq!(create_answerer(&config("WIT", credentials.clone())).unwrap().name(), "Wit.ai");
        assert_eq!(create_answerer(&config("hf", credentials)).unwrap().name(), "Hugging Face");
    }

    #[test]
    fn test_unknown_answerer() {
        let err = create_answerer(&config("oracle", Credentials::default())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
