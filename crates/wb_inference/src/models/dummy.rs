use std::fmt;

use wb_core::{ExternalAnswerer, Result};

/// Offline answerer. Replies with the opening words of the context, or a
/// fixed line when there is none.
pub struct DummyAnswerer;

impl fmt::Debug for DummyAnswerer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyAnswerer").finish()
    }
}

impl DummyAnswerer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExternalAnswerer for DummyAnswerer {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn answer(&self, question: &str, context: Option<&str>) -> Result<String> {
        match context {
            Some(context) if !context.trim().is_empty() => {
                let words: Vec<&str> = context.split_whitespace().take(20).collect();
                Ok(format!(
                    "I have no model behind me, but the article starts: {}",
                    words.join(" ")
                ))
            }
            _ => Ok(format!("I have no model behind me to answer \"{}\".", question.trim())),
        }
    }
}
