//! Wire types for the chat REST API
//!
//! Structs that mirror the backend's JSON request and response bodies.
//! Every response is wrapped in the same `{success, data?, error?}` envelope.

use crate::chat::models::{
    null_as_default, Feedback, Message, MessageId, MessageStatus, Rating, RecordId, Session,
    Source,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Response envelope shared by every endpoint
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    /// Whether the server considers the call successful
    #[serde(default)]
    pub success: bool,
    /// Payload on success
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    /// Failure details
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

/// Error details inside a failed envelope
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    /// Machine-readable code (e.g. `VALIDATION_ERROR`)
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for `POST /chat/start`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StartSessionRequest {
    /// Initial title
    pub title: String,
}

/// Body for `POST /chat/message`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Target session, serialized with the type the server gave it
    pub session_id: RecordId,
    /// Question text
    pub message: String,
    /// Answer language code
    pub language: String,
}

/// Body for `PUT /chat/session/{id}/title`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RenameSessionRequest {
    /// New title
    pub title: String,
}

/// Body for `POST /feedback/message/{id}`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    /// Score on the 1..=5 scale
    pub rating: Rating,
    /// Comment, empty when none was given
    pub comment: String,
}

/// Paging for history requests
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Page size; the server caps it at 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of records to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// A message as the server stores it
#[derive(Deserialize, Debug, Clone)]
pub struct MessageRecord {
    /// Server id (`message_id` in the send response)
    #[serde(alias = "message_id")]
    pub id: RecordId,
    /// Owning session, when included
    #[serde(default)]
    pub session_id: Option<RecordId>,
    /// Question text
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_message: String,
    /// Answer text
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_response: String,
    /// Raw sources; entries of unknown type are dropped on conversion
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<serde_json::Value>,
    /// Stored rating, if the user rated the answer
    #[serde(default)]
    pub feedback_rating: Option<i64>,
    /// Stored comment
    #[serde(default)]
    pub feedback_comment: Option<String>,
    /// Generation time in milliseconds
    #[serde(default)]
    pub response_time: Option<u64>,
    /// Tokens consumed
    #[serde(default)]
    pub tokens_used: Option<u64>,
    /// Model name
    #[serde(default)]
    pub model_used: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

impl MessageRecord {
    /// Convert into a confirmed log entry
    pub fn into_message(self) -> Message {
        let id = self.id;
        let sources = self
            .sources
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Source>(raw) {
                Ok(source) => Some(source),
                Err(e) => {
                    warn!(message_id = %id, error = %e, "Dropping unrecognized source");
                    None
                }
            })
            .collect();

        let feedback = self
            .feedback_rating
            .and_then(|raw| Rating::new(raw).ok())
            .map(|rating| Feedback {
                rating,
                comment: self.feedback_comment.filter(|c| !c.is_empty()),
            });

        Message {
            id: MessageId::Server(id),
            user_message: self.user_message,
            bot_response: self.bot_response,
            sources,
            created_at: self.created_at.unwrap_or_default(),
            status: MessageStatus::Confirmed,
            feedback,
            response_time: self.response_time,
            tokens_used: self.tokens_used,
            model_used: self.model_used,
        }
    }
}

/// Payload of `GET /chat/history`
#[derive(Deserialize, Debug, Default)]
pub struct SessionListData {
    /// Sessions, most recently updated first
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<Session>,
    /// Total sessions owned by the user
    #[serde(default)]
    pub total_sessions: Option<u64>,
    /// Total messages across all sessions
    #[serde(default)]
    pub total_messages: Option<u64>,
}

/// Payload of `GET /chat/history?session_id=ID`
#[derive(Deserialize, Debug)]
pub struct SessionHistoryData {
    /// The session itself
    pub session: Session,
    /// Messages, most recent first
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<MessageRecord>,
    /// Total messages in the session
    #[serde(default)]
    pub total_messages: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_response_uses_message_id() {
        let record: MessageRecord = serde_json::from_value(json!({
            "message_id": "m-1",
            "user_message": "What is zakat?",
            "bot_response": "Zakat is...",
            "sources": [
                {"type": "verse", "reference": "9:60", "text": "Alms are..."},
                {"type": "unknown", "reference": "?"}
            ],
            "response_time": 812,
            "tokens_used": 300,
            "created_at": "2024-03-01T10:00:00"
        }))
        .unwrap();

        let message = record.into_message();
        assert_eq!(message.id, MessageId::Server(RecordId::from("m-1")));
        assert_eq!(message.status, MessageStatus::Confirmed);
        assert_eq!(message.sources.len(), 1);
        assert_eq!(message.response_time, Some(812));
        assert!(message.feedback.is_none());
    }

    #[test]
    fn test_history_record_carries_feedback() {
        let record: MessageRecord = serde_json::from_value(json!({
            "id": 3,
            "session_id": 1,
            "user_message": "q",
            "bot_response": "a",
            "sources": null,
            "feedback_rating": 5,
            "feedback_comment": ""
        }))
        .unwrap();

        let message = record.into_message();
        assert_eq!(message.server_id(), Some(&RecordId::Number(3)));
        let feedback = message.feedback.unwrap();
        assert_eq!(feedback.rating, Rating::POSITIVE);
        assert_eq!(feedback.comment, None);
    }

    #[test]
    fn test_failed_envelope_without_data() {
        let envelope: Envelope<SessionListData> = serde_json::from_value(json!({
            "success": false,
            "error": {"code": "SESSION_NOT_FOUND", "message": "Chat session not found"}
        }))
        .unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        let error = envelope.error.unwrap();
        assert_eq!(error.code.as_deref(), Some("SESSION_NOT_FOUND"));
    }

    #[test]
    fn test_send_request_keeps_numeric_session_id() {
        let body = SendMessageRequest {
            session_id: RecordId::Number(12),
            message: "hi".to_string(),
            language: "en".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"session_id": 12, "message": "hi", "language": "en"})
        );
    }

    #[test]
    fn test_history_query_omits_unset_fields() {
        let query = HistoryQuery {
            limit: Some(50),
            offset: None,
        };
        assert_eq!(serde_json::to_value(query).unwrap(), json!({"limit": 50}));
    }
}
