//! Management client error types.

use thiserror::Error;

/// Errors from management API calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Client configuration is missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The trusted certificate could not be loaded.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The token endpoint rejected the client credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The management API returned an error response.
    #[error("management api {status}: {body}")]
    Api { status: u16, body: String },

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A lookup matched nothing.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
