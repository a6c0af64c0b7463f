//! Client configuration
//!
//! Centralized configuration with environment variable support
//! and sensible defaults.

use std::env;
use std::time::Duration;

/// Default API root, matching the development backend
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api/v1";
/// Default answer language
pub const DEFAULT_LANGUAGE: &str = "bn";
/// Title given to sessions started without one ("New chat")
pub const DEFAULT_SESSION_TITLE: &str = "নতুন চ্যাট";
/// Longest message the backend accepts
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

/// Chat client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root including the version prefix, without trailing slash
    pub api_base_url: String,
    /// Language sent with messages when the caller does not pick one
    pub default_language: String,
    /// Title used by `start_session(None)`
    pub default_session_title: String,
    /// Messages longer than this (in chars) are rejected locally
    pub max_message_chars: usize,
    /// Optional transport timeout; none unless configured
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_session_title: DEFAULT_SESSION_TITLE.to_string(),
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("CHAT_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            default_language: env::var("CHAT_DEFAULT_LANGUAGE")
                .unwrap_or(defaults.default_language),
            default_session_title: env::var("CHAT_DEFAULT_SESSION_TITLE")
                .unwrap_or(defaults.default_session_title),
            max_message_chars: env::var("CHAT_MAX_MESSAGE_CHARS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_message_chars),
            request_timeout: env::var("CHAT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Same configuration pointed at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Join a path (starting with `/`) onto the API root
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}
