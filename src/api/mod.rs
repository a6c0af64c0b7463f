//! Chat REST API
//!
//! Wire types and the HTTP client for the backend's `/api/v1` endpoints.

pub mod client;
pub mod types;

pub use client::{ChatApi, HttpChatApi};
pub use types::HistoryQuery;
