// Conversation state shared by the chat components
// Contains the session registry, the current message log, and activity flags

use crate::chat::models::{Message, RecordId, Session};
use crate::state::message_log::MessageLog;
use crate::state::session_store::SessionStore;
use tokio::sync::{watch, RwLock};

/// Everything the presentation layer renders from
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// Known sessions and the current pointer
    pub sessions: SessionStore,
    /// Messages of the current session
    pub log: MessageLog,
    /// Session starts and history loads in flight
    pub loading: usize,
    /// Sends in flight
    pub typing: usize,
}

impl ChatState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` current with an empty log
    ///
    /// `ready` is false when history still has to be loaded.
    /// Returns the log generation for the new binding.
    pub fn activate(&mut self, id: RecordId, ready: bool) -> u64 {
        self.sessions.set_current(id.clone());
        self.log.reset(Some(id), ready)
    }

    /// Drop the current session and its messages
    pub fn deactivate(&mut self) {
        self.sessions.clear_current();
        self.log.reset(None, false);
    }

    /// Owned, render-ready copy of the state
    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            sessions: self.sessions.list().into_iter().cloned().collect(),
            current_session_id: self.sessions.current_id().cloned(),
            current_session: self.sessions.current().cloned(),
            messages: self.log.messages().cloned().collect(),
            history_ready: self.log.is_ready(),
            loading: self.loading > 0,
            typing: self.typing > 0,
        }
    }
}

/// Owned view of `ChatState` for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    /// Sessions in display order
    pub sessions: Vec<Session>,
    /// Current session key
    pub current_session_id: Option<RecordId>,
    /// Current session, when known to the store
    pub current_session: Option<Session>,
    /// Messages of the current session, oldest first
    pub messages: Vec<Message>,
    /// Whether the current session's history is installed
    pub history_ready: bool,
    /// A session start or history load is in flight
    pub loading: bool,
    /// At least one send is waiting for an answer
    pub typing: bool,
}

/// `ChatState` behind a lock, with a revision counter for observers
///
/// Locks are never held across a remote call; every mutation goes through
/// `update`, which bumps the revision afterwards.
pub struct SharedState {
    inner: RwLock<ChatState>,
    revision: watch::Sender<u64>,
}

impl SharedState {
    /// Wrap a fresh state
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: RwLock::new(ChatState::new()),
            revision,
        }
    }

    /// Run `f` against the state without mutating it
    pub async fn read<R>(&self, f: impl FnOnce(&ChatState) -> R) -> R {
        let state = self.inner.read().await;
        f(&state)
    }

    /// Mutate the state and notify subscribers
    pub async fn update<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> R {
        let result = {
            let mut state = self.inner.write().await;
            f(&mut state)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Owned copy of the current state
    pub async fn snapshot(&self) -> ChatSnapshot {
        self.read(ChatState::snapshot).await
    }

    /// Receiver that changes after every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
