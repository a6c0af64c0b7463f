//! Knowledge Chat Client
//!
//! Conversation session manager for a question-answering assistant that
//! cites its sources. Tracks sessions and messages in memory, applies
//! optimistic updates against the REST backend, and reconciles or rolls
//! them back when the server answers.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
/// Conversation state
///
/// Session registry, current message log, and change notification.
pub mod state;

pub use chat::ConversationManager;
pub use config::ClientConfig;
pub use error::{ChatError, Result};
