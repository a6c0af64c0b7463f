//! Authentication header sources
//!
//! The chat core never validates or stores credentials. It asks an
//! `AuthHeaderSource` for headers before every request and merges whatever
//! comes back; the server decides whether the request is authorized.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Produces the headers to attach to an authenticated request
///
/// Implementations return an empty map when no credential is available.
pub trait AuthHeaderSource: Send + Sync {
    /// Header name to value pairs for the next outgoing request
    fn headers(&self) -> HashMap<String, String>;
}

/// Source for unauthenticated clients
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthHeaderSource for NoAuth {
    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Bearer token shared with an external auth provider
///
/// Clones share the same slot, so the provider can refresh or clear the
/// token while the chat core keeps reading it.
#[derive(Debug, Clone, Default)]
pub struct BearerAuth {
    token: Arc<RwLock<Option<String>>>,
}

impl BearerAuth {
    /// Create a source, optionally seeded with a token
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Replace the current token
    pub fn set_token(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    /// Forget the current token (logout)
    pub fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl AuthHeaderSource for BearerAuth {
    fn headers(&self) -> HashMap<String, String> {
        let slot = self.token.read().unwrap_or_else(|e| e.into_inner());
        match slot.as_deref() {
            Some(token) if !token.is_empty() => HashMap::from([(
                "Authorization".to_string(),
                format!("Bearer {}", token),
            )]),
            _ => HashMap::new(),
        }
    }
}
