use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use wb_core::{http, Error, ExternalAnswerer, Result};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<InferenceParameters<'a>>,
}

#[derive(Serialize)]
struct InferenceParameters<'a> {
    context: &'a str,
}

/// Hosted question answering / text generation through the Hugging Face
/// Inference API.
pub struct HuggingFaceAnswerer {
    client: Client,
    api_token: String,
    model_url: String,
}

impl HuggingFaceAnswerer {
    pub fn new(client: Client, api_token: String, model_url: impl Into<String>) -> Self {
        Self {
            client,
            api_token,
            model_url: model_url.into(),
        }
    }
}

impl fmt::Debug for HuggingFaceAnswerer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceAnswerer")
            .field("client", &"<reqwest::Client>")
            .field("api_token", &"<redacted>")
            .field("model_url", &self.model_url)
            .finish()
    }
}

#[async_trait]
impl ExternalAnswerer for HuggingFaceAnswerer {
    fn name(&self) -> &str {
        "Hugging Face"
    }

    async fn answer(&self, question: &str, context: Option<&str>) -> Result<String> {
        let request = InferenceRequest {
            inputs: question,
            parameters: context.map(|context| InferenceParameters { context }),
        };

        let response = self
            .client
            .post(&self.model_url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::external_api(self.name(), None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::external_api(
                self.name(),
                Some(status.as_u16()),
                http::error_body(&body),
            ));
        }

        let body = response.json::<Value>().await?;
        extract_answer(&body).ok_or_else(|| {
            Error::external_api(self.name(), Some(status.as_u16()), "response carried no answer")
        })
    }
}

/// Accepts the shapes the hosted pipelines return:
/// `[{"generated_text": ..}]`, `{"generated_text": ..}` and `{"answer": ..}`.
fn extract_answer(body: &Value) -> Option<String> {
    let item = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };

    ["answer", "generated_text"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
