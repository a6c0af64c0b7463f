//! Conversation manager
//!
//! The central state machine: starts, switches, renames and deletes
//! sessions, and sends messages with optimistic updates.
//!
//! Each message moves `Pending -> Confirmed` or `Pending -> (removed)`.
//! Resolution is addressed by the temporary id and the session id captured
//! when the request was issued, never by whatever is current at the time
//! the response arrives.

use crate::api::client::{ChatApi, HttpChatApi};
use crate::api::types::{
    HistoryQuery, RenameSessionRequest, SendMessageRequest, StartSessionRequest,
};
use crate::auth::AuthHeaderSource;
use crate::chat::feedback::FeedbackRecorder;
use crate::chat::history::HistoryLoader;
use crate::chat::models::{Message, MessageId, Rating, RecordId, Session};
use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use crate::state::{ChatSnapshot, SharedState};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// The backend truncates titles to this many characters
const MAX_TITLE_CHARS: usize = 200;

/// Orchestrates sessions and messages against the chat API
pub struct ConversationManager {
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
    config: ClientConfig,
    history: HistoryLoader,
    feedback: FeedbackRecorder,
    /// Serializes implicit session starts from concurrent sends
    implicit_start: Mutex<()>,
}

impl ConversationManager {
    /// Create a manager over any `ChatApi`
    pub fn new(api: Arc<dyn ChatApi>, config: ClientConfig) -> Self {
        let state = Arc::new(SharedState::new());
        Self {
            history: HistoryLoader::new(api.clone(), state.clone()),
            feedback: FeedbackRecorder::new(api.clone(), state.clone()),
            api,
            state,
            config,
            implicit_start: Mutex::new(()),
        }
    }

    /// Create a manager talking HTTP to `config.api_base_url`
    ///
    /// # Errors
    /// * Returns `ChatError::Remote` if the HTTP client cannot be constructed
    pub fn connect(config: ClientConfig, auth: Arc<dyn AuthHeaderSource>) -> Result<Self> {
        let api = HttpChatApi::new(config.clone(), auth)?;
        Ok(Self::new(Arc::new(api), config))
    }

    /// Apply `page` to every session list and history request
    pub fn with_history_page(mut self, page: HistoryQuery) -> Self {
        self.history = self.history.with_page(page);
        self
    }

    /// History loader sharing this manager's state
    pub fn history(&self) -> &HistoryLoader {
        &self.history
    }

    /// Owned copy of the current state
    pub async fn snapshot(&self) -> ChatSnapshot {
        self.state.snapshot().await
    }

    /// Receiver that changes after every state mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }

    /// Start a new session and make it current
    ///
    /// On failure no session is created locally and the current session is
    /// untouched. Once issued, the request completes even if the caller
    /// stops waiting.
    pub async fn start_session(&self, title: Option<&str>) -> Result<Session> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.config.default_session_title.as_str())
            .to_string();

        let task = tokio::spawn(create_session(
            self.api.clone(),
            self.state.clone(),
            StartSessionRequest { title },
        ));
        task.await?
    }

    /// Send a message, showing it immediately as pending
    ///
    /// Starts a session first when none is current. The pending entry is
    /// replaced in place by the server's message on success and removed on
    /// failure. Resolution runs in its own task and completes even if the
    /// caller stops waiting.
    ///
    /// # Errors
    /// * `ChatError::Validation` for empty or over-long text, or while the
    ///   current session's history is not loaded
    /// * `ChatError::Remote` / `ChatError::Api` from the session start or send
    pub async fn send_message(&self, text: &str, language: Option<&str>) -> Result<Message> {
        if text.trim().is_empty() {
            return Err(ChatError::validation("Message cannot be empty"));
        }
        let length = text.chars().count();
        if length > self.config.max_message_chars {
            return Err(ChatError::validation(format!(
                "Message too long ({} characters, max {})",
                length, self.config.max_message_chars
            )));
        }
        let language = language
            .unwrap_or(self.config.default_language.as_str())
            .to_string();

        self.ensure_session().await?;

        let pending = Message::pending(text);
        let (session_id, temporary_id) = self
            .state
            .update(|s| {
                let session_id = s
                    .sessions
                    .current_id()
                    .cloned()
                    .ok_or_else(|| ChatError::validation("No current session"))?;
                if s.log.session_id() != Some(&session_id) || !s.log.is_ready() {
                    return Err(ChatError::validation(
                        "History for the current session is not loaded",
                    ));
                }
                let temporary_id = s.log.append(pending);
                s.typing += 1;
                Ok((session_id, temporary_id))
            })
            .await?;

        debug!(
            session_id = %session_id,
            temporary_id = %temporary_id,
            "Appended pending message"
        );

        let request = SendMessageRequest {
            session_id,
            message: text.to_string(),
            language,
        };
        let task = tokio::spawn(deliver(
            self.api.clone(),
            self.state.clone(),
            request,
            temporary_id,
        ));
        task.await?
    }

    /// Make another session current and load its history
    ///
    /// The log is emptied before the request is issued, so it never shows
    /// the previous conversation. Pending messages of the previous session
    /// are discarded.
    pub async fn switch_session(&self, session_id: &RecordId) -> Result<(Session, Vec<Message>)> {
        let generation = self
            .state
            .update(|s| s.activate(session_id.clone(), false))
            .await;
        info!(session_id = %session_id, "Switching session");
        self.history.fetch_into(session_id, generation).await
    }

    /// Delete a session on the server, then locally
    ///
    /// Deleting the current session clears it and empties the log. On
    /// failure local state is untouched.
    pub async fn delete_session(&self, session_id: &RecordId) -> Result<()> {
        if let Err(e) = self.api.delete_session(session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to delete session");
            return Err(e);
        }

        let was_current = self
            .state
            .update(|s| {
                let was_current = s.sessions.current_id() == Some(session_id);
                s.sessions.remove(session_id);
                if was_current {
                    s.deactivate();
                }
                was_current
            })
            .await;
        info!(session_id = %session_id, was_current, "Chat session deleted");
        Ok(())
    }

    /// Rename a session once the server confirms
    pub async fn rename_session(&self, session_id: &RecordId, title: &str) -> Result<()> {
        let title: String = title.trim().chars().take(MAX_TITLE_CHARS).collect();
        if title.is_empty() {
            return Err(ChatError::validation("Title is required"));
        }

        let request = RenameSessionRequest {
            title: title.clone(),
        };
        if let Err(e) = self.api.rename_session(session_id, &request).await {
            warn!(session_id = %session_id, error = %e, "Failed to rename session");
            return Err(e);
        }

        let known = self
            .state
            .update(|s| s.sessions.rename(session_id, &title))
            .await;
        info!(session_id = %session_id, known, "Chat session renamed");
        Ok(())
    }

    /// Replace the session list with the server's
    pub async fn load_session_list(&self) -> Result<Vec<Session>> {
        self.history.load_session_list().await
    }

    /// Rate a confirmed message in the current log
    pub async fn submit_feedback(
        &self,
        message_id: &MessageId,
        rating: Rating,
        comment: Option<&str>,
    ) -> Result<()> {
        self.feedback
            .submit_feedback(message_id, rating, comment)
            .await
    }

    /// Start a session if none is current
    ///
    /// Concurrent sends share one implicit start.
    async fn ensure_session(&self) -> Result<()> {
        if self.state.read(|s| s.sessions.current_id().is_some()).await {
            return Ok(());
        }
        let _guard = self.implicit_start.lock().await;
        if self.state.read(|s| s.sessions.current_id().is_some()).await {
            return Ok(());
        }
        debug!("No current session, starting one before sending");
        self.start_session(None).await.map(|_| ())
    }
}

async fn create_session(
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
    request: StartSessionRequest,
) -> Result<Session> {
    state.update(|s| s.loading += 1).await;
    let result = api.start_session(&request).await;

    match result {
        Ok(session) => {
            state
                .update(|s| {
                    s.loading = s.loading.saturating_sub(1);
                    s.sessions.insert_front(session.clone());
                    s.activate(session.id.clone(), true);
                })
                .await;
            info!(session_id = %session.id, "Chat session started");
            Ok(session)
        }
        Err(e) => {
            state
                .update(|s| s.loading = s.loading.saturating_sub(1))
                .await;
            warn!(error = %e, "Failed to start chat session");
            Err(e)
        }
    }
}

/// Issue a send and reconcile the pending entry `temporary_id`
async fn deliver(
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
    request: SendMessageRequest,
    temporary_id: MessageId,
) -> Result<Message> {
    let session_id = request.session_id.clone();
    let result = api.send_message(&request).await;

    match result {
        Ok(record) => {
            let confirmed = record.into_message();
            let applied = state
                .update(|s| {
                    s.typing = s.typing.saturating_sub(1);
                    s.log.session_id() == Some(&session_id)
                        && s.log.confirm(&temporary_id, confirmed.clone())
                })
                .await;
            if applied {
                debug!(
                    session_id = %session_id,
                    message_id = %confirmed.id,
                    "Pending message confirmed"
                );
            } else {
                warn!(
                    session_id = %session_id,
                    temporary_id = %temporary_id,
                    "Discarding reply for a message no longer in the log"
                );
            }
            Ok(confirmed)
        }
        Err(e) => {
            let rolled_back = state
                .update(|s| {
                    s.typing = s.typing.saturating_sub(1);
                    s.log.rollback(&temporary_id).is_some()
                })
                .await;
            warn!(
                session_id = %session_id,
                temporary_id = %temporary_id,
                rolled_back,
                error = %e,
                "Send failed, pending message removed"
            );
            Err(e)
        }
    }
}
