//! Error types for the chat client
//!
//! Every public operation returns `Result<T, ChatError>`. The three variants
//! separate what never left the process, what never got an answer, and what
//! the server explicitly refused.

use thiserror::Error;

/// Errors surfaced by chat operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// A local precondition was violated; no request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// No usable response was obtained (connection failure, unreadable body)
    #[error("Network error: {0}")]
    Remote(String),

    /// The server answered with a non-2xx status or `success: false`
    #[error("{message}")]
    Api {
        /// HTTP status, when the failure came with one
        status: Option<u16>,
        /// Machine-readable code from the error envelope (e.g. `SESSION_NOT_FOUND`)
        code: Option<String>,
        /// Server-provided message, or the operation's fallback text
        message: String,
    },
}

impl ChatError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ChatError::Validation(message.into())
    }

    /// True when the server rejected the request as unauthenticated
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ChatError::Api { status: Some(401), .. })
    }

    /// True when re-issuing the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::Remote(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::Remote(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ChatError {
    fn from(e: tokio::task::JoinError) -> Self {
        ChatError::Remote(format!("Background task failed: {}", e))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ChatError>;
