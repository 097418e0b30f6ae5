use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{service} returned {}: {message}", status_label(.status))]
    ExternalApi {
        service: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn external_api(
        service: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::ExternalApi {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Article loading failures: network, non-2xx and missing page structure
    /// all read the same to the user.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::Fetch(_) | Error::Parse(_) | Error::Http(_) | Error::InvalidUrl(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            e if e.is_fetch_failure() => format!("Could not load the article: {}", e),
            Error::ExternalApi { service, .. } => {
                format!("Sorry, {} is not available right now. Please try again later.", service)
            }
            Error::MissingCredential(name) => {
                format!("This feature needs {} to be set before starting.", name)
            }
            other => format!("Error: {}", other),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "an error".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
