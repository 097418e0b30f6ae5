use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use wb_core::{http, Error, ExternalAnswerer, Result};

pub const WIT_API_VERSION: &str = "20220217";
const DEFAULT_BASE_URL: &str = "https://api.wit.ai";
const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";

#[derive(Deserialize)]
struct MessageResponse {
    msg: Option<String>,
}

/// Natural-language-understanding backend. Article context is not forwarded;
/// the message endpoint only takes the question.
pub struct WitAnswerer {
    client: Client,
    access_token: String,
    base_url: String,
}

impl WitAnswerer {
    pub fn new(client: Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for WitAnswerer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WitAnswerer")
            .field("client", &"<reqwest::Client>")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl ExternalAnswerer for WitAnswerer {
    fn name(&self) -> &str {
        "Wit.ai"
    }

    async fn answer(&self, question: &str, _context: Option<&str>) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/message", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("v", WIT_API_VERSION), ("q", question)])
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

        let body = response.json::<MessageResponse>().await?;
        Ok(reply_text(body))
    }
}

fn reply_text(body: MessageResponse) -> String {
    body.msg
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}
