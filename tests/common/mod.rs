//! Shared helpers for integration tests
//!
//! `ScriptedApi` forwards every remote call to the test through a channel
//! and waits for the test to answer it, so tests decide exactly when and in
//! which order responses arrive.

#![allow(dead_code)]

use async_trait::async_trait;
use knowledge_chat_client::api::types::{
    FeedbackRequest, HistoryQuery, MessageRecord, RenameSessionRequest, SendMessageRequest,
    SessionHistoryData, SessionListData, StartSessionRequest,
};
use knowledge_chat_client::api::ChatApi;
use knowledge_chat_client::chat::{Message, MessageStatus, RecordId, Session};
use knowledge_chat_client::state::ChatSnapshot;
use knowledge_chat_client::{ChatError, ClientConfig, ConversationManager, Result};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};

/// Reply handle for one pending call
pub type Responder<T> = oneshot::Sender<Result<T>>;

/// A remote call waiting for the test to answer
pub enum Call {
    Start(StartSessionRequest, Responder<Session>),
    Send(SendMessageRequest, Responder<MessageRecord>),
    List(Responder<SessionListData>),
    History(RecordId, Responder<SessionHistoryData>),
    Delete(RecordId, Responder<()>),
    Rename(RecordId, RenameSessionRequest, Responder<()>),
    Feedback(RecordId, FeedbackRequest, Responder<()>),
}

/// `ChatApi` whose answers are supplied by the test
pub struct ScriptedApi {
    calls: mpsc::UnboundedSender<Call>,
}

impl ScriptedApi {
    async fn roundtrip<T>(&self, make: impl FnOnce(Responder<T>) -> Call) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .send(make(tx))
            .map_err(|_| ChatError::Remote("script closed".to_string()))?;
        rx.await
            .unwrap_or_else(|_| Err(ChatError::Remote("responder dropped".to_string())))
    }
}

#[async_trait]
impl ChatApi for ScriptedApi {
    async fn start_session(&self, request: &StartSessionRequest) -> Result<Session> {
        self.roundtrip(|tx| Call::Start(request.clone(), tx)).await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<MessageRecord> {
        self.roundtrip(|tx| Call::Send(request.clone(), tx)).await
    }

    async fn list_sessions(&self, _query: HistoryQuery) -> Result<SessionListData> {
        self.roundtrip(Call::List).await
    }

    async fn session_history(
        &self,
        session_id: &RecordId,
        _query: HistoryQuery,
    ) -> Result<SessionHistoryData> {
        self.roundtrip(|tx| Call::History(session_id.clone(), tx)).await
    }

    async fn delete_session(&self, session_id: &RecordId) -> Result<()> {
        self.roundtrip(|tx| Call::Delete(session_id.clone(), tx)).await
    }

    async fn rename_session(
        &self,
        session_id: &RecordId,
        request: &RenameSessionRequest,
    ) -> Result<()> {
        self.roundtrip(|tx| Call::Rename(session_id.clone(), request.clone(), tx))
            .await
    }

    async fn submit_feedback(
        &self,
        message_id: &RecordId,
        request: &FeedbackRequest,
    ) -> Result<()> {
        self.roundtrip(|tx| Call::Feedback(message_id.clone(), request.clone(), tx))
            .await
    }
}

/// Test side of a `ScriptedApi`
pub struct Script {
    calls: mpsc::UnboundedReceiver<Call>,
}

impl Script {
    /// Next call, failing the test if none arrives promptly
    pub async fn next(&mut self) -> Call {
        timeout(Duration::from_secs(5), self.calls.recv())
            .await
            .expect("timed out waiting for a remote call")
            .expect("api dropped")
    }

    /// True if no call has been issued since the last `next`
    pub fn is_idle(&mut self) -> bool {
        self.calls.try_recv().is_err()
    }

    pub async fn expect_start(&mut self) -> (StartSessionRequest, Responder<Session>) {
        match self.next().await {
            Call::Start(request, reply) => (request, reply),
            _ => panic!("expected a session start"),
        }
    }

    pub async fn expect_send(&mut self) -> (SendMessageRequest, Responder<MessageRecord>) {
        match self.next().await {
            Call::Send(request, reply) => (request, reply),
            _ => panic!("expected a message send"),
        }
    }

    pub async fn expect_history(&mut self) -> (RecordId, Responder<SessionHistoryData>) {
        match self.next().await {
            Call::History(id, reply) => (id, reply),
            _ => panic!("expected a history load"),
        }
    }
}

/// Manager over a scripted API with default configuration
pub fn scripted_manager() -> (Arc<ConversationManager>, Script) {
    let (tx, rx) = mpsc::unbounded_channel();
    let api = Arc::new(ScriptedApi { calls: tx });
    let manager = Arc::new(ConversationManager::new(api, ClientConfig::default()));
    (manager, Script { calls: rx })
}

/// Start a session with id `id`, answering the start call
pub async fn start_session(
    manager: &Arc<ConversationManager>,
    script: &mut Script,
    id: &str,
) -> Session {
    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start_session(None).await })
    };
    let (_, reply) = script.expect_start().await;
    reply.send(Ok(Session::new(id, "নতুন চ্যাট"))).ok();
    task.await.unwrap().unwrap()
}

/// Server reply to a sent message
pub fn reply_for(id: &str, text: &str) -> MessageRecord {
    serde_json::from_value(json!({
        "message_id": id,
        "user_message": text,
        "bot_response": format!("reply-{}", text),
        "sources": [],
        "created_at": "2024-03-01T10:00:00"
    }))
    .unwrap()
}

/// History payload; `newest_first` lists message texts most recent first
pub fn history_for(id: &str, newest_first: &[&str]) -> SessionHistoryData {
    let messages: Vec<_> = newest_first
        .iter()
        .map(|text| {
            json!({
                "id": format!("{}-{}", id, text),
                "session_id": id,
                "user_message": text,
                "bot_response": format!("reply-{}", text),
                "sources": []
            })
        })
        .collect();
    serde_json::from_value(json!({
        "session": {"id": id, "title": format!("Session {}", id)},
        "messages": messages
    }))
    .unwrap()
}

/// (user_message, status) pairs in log order
pub fn log_view(messages: &[Message]) -> Vec<(String, MessageStatus)> {
    messages
        .iter()
        .map(|m| (m.user_message.clone(), m.status))
        .collect()
}

/// Wait until `done` holds for the manager's state, failing after 5s
pub async fn wait_for(
    manager: &ConversationManager,
    done: impl Fn(&ChatSnapshot) -> bool,
) -> ChatSnapshot {
    let mut changes = manager.subscribe();
    timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = manager.snapshot().await;
            if done(&snapshot) {
                return snapshot;
            }
            changes.changed().await.expect("state dropped");
        }
    })
    .await
    .expect("timed out waiting for state")
}
