use std::fmt;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use wb_core::{Error, ImageBackend, ImageResponse, Result};

#[derive(Serialize)]
struct ImageRequest<'a> {
    inputs: &'a str,
}

/// Text-to-image endpoint of the Hugging Face Inference API.
pub struct HuggingFaceImageBackend {
    client: Client,
    api_token: String,
    model_url: String,
}

impl HuggingFaceImageBackend {
    pub fn new(client: Client, api_token: String, model_url: impl Into<String>) -> Self {
        Self {
            client,
            api_token,
            model_url: model_url.into(),
        }
    }
}

impl fmt::Debug for HuggingFaceImageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceImageBackend")
            .field("client", &"<reqwest::Client>")
            .field("api_token", &"<redacted>")
            .field("model_url", &self.model_url)
            .finish()
    }
}

#[async_trait]
impl ImageBackend for HuggingFaceImageBackend {
    fn name(&self) -> &str {
        "Hugging Face image generation"
    }

    async fn generate(&self, prompt: &str) -> Result<ImageResponse> {
        let response = self
            .client
            .post(&self.model_url)
            .bearer_auth(&self.api_token)
            .json(&ImageRequest { inputs: prompt })
            .send()
            .await
            .map_err(|e| Error::external_api(self.name(), None, e.to_string()))?;
        into_image_response(response).await
    }

    async fn download(&self, url: &str) -> Result<ImageResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::external_api(self.name(), None, e.to_string()))?;
        into_image_response(response).await
    }
}

async fn into_image_response(response: Response) -> Result<ImageResponse> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?;

    Ok(ImageResponse {
        status,
        content_type,
        body: body.to_vec(),
    })
}
