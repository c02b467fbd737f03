// Error types shared by the REST layer, the gateways and the filter engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unreadable backend credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never got an HTTP response (refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    /// A row carried a value that cannot be read as the expected number.
    #[error("invalid value: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's top-level message only names the URL; the cause sits lower.
        let mut reason = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        Error::Network(reason)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
