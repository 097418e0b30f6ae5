pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod models;
pub mod session;
pub mod text;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use history::ConversationHistory;
pub use models::{ExternalAnswerer, ImageBackend, ImageResponse};
pub use session::Session;
pub use types::{Article, ConversationEntry, FaqEntry, ImageFormat, ImageResult, Reference};
