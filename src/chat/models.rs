//! Chat data models
//!
//! Sessions, messages and the cited sources attached to answers.

use crate::error::{ChatError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned by the server
///
/// The backend may hand out numbers or strings. The variant received is the
/// variant sent back, so ids survive a round trip without coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric id
    Number(i64),
    /// String id (UUIDs in the reference backend)
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

/// A conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Server id (`session_id` in the start response, `id` elsewhere)
    #[serde(alias = "session_id")]
    pub id: RecordId,
    /// Display title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Creation time as sent by the server
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update time, server controlled
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Number of messages, when the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u32>,
    /// Whether the server still considers the session active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Opaque token issued on session start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl Session {
    /// Minimal session with only id and title
    pub fn new(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: None,
            updated_at: None,
            message_count: None,
            is_active: None,
            session_token: None,
        }
    }

    /// Get created_at as DateTime
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Get updated_at as DateTime
    pub fn updated_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

/// A cited excerpt backing an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    /// Quran verse
    Verse {
        /// Surah:verse reference
        reference: String,
        /// Translation shown to the user
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        /// Arabic original
        #[serde(default)]
        arabic: Option<String>,
    },
    /// Hadith narration
    Hadith {
        /// Collection and number
        reference: String,
        /// Translation shown to the user
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        /// Arabic original
        #[serde(default)]
        arabic: Option<String>,
        /// Narrator chain head
        #[serde(default)]
        narrator: Option<String>,
        /// Authenticity grade (sahih, hasan, ...)
        #[serde(default)]
        grade: Option<String>,
    },
    /// Scholarly ruling
    Fatwa {
        /// Ruling reference
        reference: String,
        /// Question the ruling answers
        #[serde(default)]
        question: Option<String>,
        /// The ruling itself
        #[serde(default, deserialize_with = "null_as_default")]
        answer: String,
        /// Issuing scholar
        #[serde(default)]
        scholar: Option<String>,
    },
}

impl Source {
    /// Reference identifier of the excerpt
    pub fn reference(&self) -> &str {
        match self {
            Source::Verse { reference, .. }
            | Source::Hadith { reference, .. }
            | Source::Fatwa { reference, .. } => reference,
        }
    }

    /// Text to display for the excerpt
    pub fn display_text(&self) -> &str {
        match self {
            Source::Verse { text, .. } | Source::Hadith { text, .. } => text,
            Source::Fatwa { answer, .. } => answer,
        }
    }

    /// Original-language text, if any
    pub fn original_text(&self) -> Option<&str> {
        match self {
            Source::Verse { arabic, .. } | Source::Hadith { arabic, .. } => arabic.as_deref(),
            Source::Fatwa { .. } => None,
        }
    }
}

/// Feedback score on the backend's 1..=5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Lowest score ("thumbs down")
    pub const NEGATIVE: Rating = Rating(1);
    /// Highest score ("thumbs up")
    pub const POSITIVE: Rating = Rating(5);

    /// Validate a raw score
    pub fn new(value: i64) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(ChatError::validation(format!(
                "Rating must be between 1 and 5, got {}",
                value
            )))
        }
    }

    /// Raw score
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Feedback attached to a confirmed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    /// Score
    pub rating: Rating,
    /// Optional free-text comment
    pub comment: Option<String>,
}

/// Local identity of a message in the log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Client-generated token for an optimistic entry
    Temporary(Uuid),
    /// Id assigned by the server once confirmed
    Server(RecordId),
}

impl MessageId {
    /// Fresh temporary id; unique for the life of the process
    pub fn temporary() -> Self {
        MessageId::Temporary(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Temporary(token) => write!(f, "pending-{}", token),
            MessageId::Server(id) => write!(f, "{}", id),
        }
    }
}

/// Lifecycle of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    /// Sent optimistically, waiting for the server
    Pending,
    /// Returned by the server
    Confirmed,
}

/// One question/answer exchange
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Temporary while pending, server id once confirmed
    pub id: MessageId,
    /// What the user asked
    pub user_message: String,
    /// The assistant's answer; empty while pending
    pub bot_response: String,
    /// Cited sources, in server order; empty while pending
    pub sources: Vec<Source>,
    /// Creation time (server-provided once confirmed)
    pub created_at: String,
    /// Pending or confirmed
    pub status: MessageStatus,
    /// User rating, if any
    pub feedback: Option<Feedback>,
    /// Server-side generation time in milliseconds
    pub response_time: Option<u64>,
    /// Tokens consumed producing the answer
    pub tokens_used: Option<u64>,
    /// Model that produced the answer
    pub model_used: Option<String>,
}

impl Message {
    /// Create an optimistic entry for text about to be sent
    pub fn pending(user_message: impl Into<String>) -> Self {
        Self {
            id: MessageId::temporary(),
            user_message: user_message.into(),
            bot_response: String::new(),
            sources: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
            status: MessageStatus::Pending,
            feedback: None,
            response_time: None,
            tokens_used: None,
            model_used: None,
        }
    }

    /// Whether the server has not answered yet
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }

    /// Server id, once confirmed
    pub fn server_id(&self) -> Option<&RecordId> {
        match &self.id {
            MessageId::Server(id) => Some(id),
            MessageId::Temporary(_) => None,
        }
    }

    /// Get created_at as DateTime
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Parse RFC 3339, or the naive ISO format the backend emits (implicitly UTC)
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_keeps_its_json_type() {
        let numeric: RecordId = serde_json::from_value(json!(42)).unwrap();
        let text: RecordId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(numeric, RecordId::Number(42));
        assert_eq!(text, RecordId::Text("42".to_string()));
        assert_ne!(numeric, text);
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("42"));
    }

    #[test]
    fn test_session_accepts_session_id_alias() {
        let session: Session = serde_json::from_value(json!({
            "session_id": "abc",
            "session_token": "tok",
            "title": "নতুন চ্যাট",
            "created_at": "2024-03-01T10:00:00.123456"
        }))
        .unwrap();
        assert_eq!(session.id, RecordId::from("abc"));
        assert_eq!(session.title, "নতুন চ্যাট");
        assert!(session.created_at_datetime().is_some());
        assert!(session.updated_at.is_none());
    }

    #[test]
    fn test_session_null_title_is_empty() {
        let session: Session =
            serde_json::from_value(json!({"id": 7, "title": null})).unwrap();
        assert_eq!(session.id, RecordId::Number(7));
        assert_eq!(session.title, "");
    }

    #[test]
    fn test_source_variants() {
        let sources: Vec<Source> = serde_json::from_value(json!([
            {"type": "verse", "reference": "2:255", "text": "Allah...", "arabic": "ٱللَّهُ"},
            {"type": "hadith", "reference": "Bukhari 1", "text": "Actions...",
             "narrator": "Umar", "grade": "sahih"},
            {"type": "fatwa", "reference": "F-9", "question": "Q?", "answer": "A.",
             "scholar": "Shaykh"}
        ]))
        .unwrap();

        assert_eq!(sources[0].reference(), "2:255");
        assert_eq!(sources[0].original_text(), Some("ٱللَّهُ"));
        assert_eq!(sources[1].display_text(), "Actions...");
        assert!(matches!(&sources[1], Source::Hadith { grade: Some(g), .. } if g == "sahih"));
        assert_eq!(sources[2].display_text(), "A.");
        assert_eq!(sources[2].original_text(), None);
    }

    #[test]
    fn test_rating_bounds() {
        assert_eq!(Rating::new(1).unwrap(), Rating::NEGATIVE);
        assert_eq!(Rating::new(5).unwrap(), Rating::POSITIVE);
        assert!(matches!(Rating::new(0), Err(ChatError::Validation(_))));
        assert!(matches!(Rating::new(6), Err(ChatError::Validation(_))));
    }

    #[test]
    fn test_pending_message_shape() {
        let a = Message::pending("hello");
        let b = Message::pending("hello");
        assert!(a.is_pending());
        assert!(a.bot_response.is_empty());
        assert!(a.sources.is_empty());
        assert!(a.server_id().is_none());
        assert_ne!(a.id, b.id);
        assert!(a.created_at_datetime().is_some());
    }
}
