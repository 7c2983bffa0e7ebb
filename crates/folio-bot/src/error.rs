//! Bot error types

use folio_store::StoreError;
use thiserror::Error;

/// Errors raised by the bot runtime
#[derive(Debug, Error)]
pub enum BotError {
    /// A required environment variable is not set
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// An environment variable is set but unparseable
    #[error("invalid value for environment variable {0}")]
    InvalidEnv(&'static str),

    /// The HTTP request itself failed
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram accepted the request but returned `ok: false`
    #[error("telegram api error: {0}")]
    Telegram(String),

    /// The analytics backend returned an unusable response
    #[error("analytics backend error: {0}")]
    Analytics(String),

    /// A content store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
