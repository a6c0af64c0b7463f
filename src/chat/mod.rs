//! Chat module
//!
//! Conversation data models and the components that drive them: the
//! conversation manager, history loading and feedback.

pub mod feedback;
pub mod history;
pub mod manager;
pub mod models;

pub use feedback::FeedbackRecorder;
pub use history::HistoryLoader;
pub use manager::ConversationManager;
pub use models::{
    Feedback, Message, MessageId, MessageStatus, Rating, RecordId, Session, Source,
};
