// State management module
// Handles the session registry, the current message log, and change notification

pub mod app_state;
pub mod message_log;
pub mod session_store;

pub use app_state::{ChatSnapshot, ChatState, SharedState};
pub use message_log::MessageLog;
pub use session_store::SessionStore;
