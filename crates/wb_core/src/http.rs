use std::time::Duration;

use reqwest::Client;

use crate::Result;

pub const USER_AGENT: &str = concat!("wikibot/", env!("CARGO_PKG_VERSION"), " (article analyzer)");

/// Shared HTTP client. Wikipedia rejects requests without a user agent.
pub fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Pulls a readable message out of an error body, preferring a JSON
/// `error` field.
pub fn error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }

    crate::text::truncate_chars(trimmed, 300).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body() {
        assert_eq!(error_body("  "), "<empty body>");
        assert_eq!(
            error_body(r#"{"error": "Model is currently loading"}"#),
            "Model is currently loading"
        );
        assert_eq!(error_body("plain failure"), "plain failure");
        assert_eq!(error_body(&"x".repeat(500)).len(), 300);
    }
}
