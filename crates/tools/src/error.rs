use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a single tool invocation.
///
/// Every variant is local to the invocation that produced it; none of them
/// affect the shared management client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// A required argument is absent or has the wrong type.
    #[error("missing or invalid argument `{key}`: expected {expected}")]
    MissingOrInvalidArgument { key: String, expected: &'static str },

    /// One element of a structured array argument is malformed.
    #[error("invalid element at `{key}[{index}]`: {reason}")]
    InvalidElementFormat {
        key: String,
        index: usize,
        reason: String,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Management(#[from] asgardeo::Error),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    pub(crate) fn missing(key: &str, expected: &'static str) -> Self {
        Self::MissingOrInvalidArgument {
            key: key.to_string(),
            expected,
        }
    }
}

/// The management client could not be configured or built.
///
/// Cached by the client accessor and handed to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("configuration error: {0}")]
pub struct ConfigurationError(pub String);

impl From<asgardeo::Error> for ConfigurationError {
    fn from(e: asgardeo::Error) -> Self {
        Self(e.to_string())
    }
}

/// Failures of a submit, poll and fetch workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PollError {
    #[error("operation submission failed: {0}")]
    SubmissionFailed(String),

    #[error("status query {attempt} for operation {operation_id} failed: {reason}")]
    PollingFailed {
        operation_id: String,
        attempt: u32,
        reason: String,
    },

    #[error("fetching result of operation {operation_id} failed: {reason}")]
    ResultFetchFailed { operation_id: String, reason: String },

    #[error("operation {operation_id} still incomplete after {attempts} status queries")]
    AttemptsExhausted { operation_id: String, attempts: u32 },

    #[error("operation {operation_id} did not complete within {timeout:?}")]
    DeadlineExceeded {
        operation_id: String,
        timeout: Duration,
    },

    #[error("operation cancelled")]
    Cancelled { operation_id: Option<String> },
}

pub type Result<T> = std::result::Result<T, ToolError>;
