//! History loading
//!
//! Bulk-fetches the session list or one session's messages and installs the
//! result into shared state. Installation is guarded: a history response is
//! only written if its session is still current and the log has not been
//! reset since the request was issued.

use crate::api::client::ChatApi;
use crate::api::types::HistoryQuery;
use crate::chat::models::{Message, RecordId, Session};
use crate::error::Result;
use crate::state::SharedState;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fetches sessions and message history
pub struct HistoryLoader {
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
    page: HistoryQuery,
}

impl HistoryLoader {
    /// Create a loader over shared state
    pub fn new(api: Arc<dyn ChatApi>, state: Arc<SharedState>) -> Self {
        Self {
            api,
            state,
            page: HistoryQuery::default(),
        }
    }

    /// Use explicit paging for every history request
    pub fn with_page(mut self, page: HistoryQuery) -> Self {
        self.page = page;
        self
    }

    /// Replace the session list with the server's, in server order
    ///
    /// The request and the state update run in their own task, so dropping
    /// the returned future does not leave the loading flag set.
    pub async fn load_session_list(&self) -> Result<Vec<Session>> {
        let task = tokio::spawn(refresh_session_list(
            self.api.clone(),
            self.state.clone(),
            self.page,
        ));
        task.await?
    }

    /// Make `session_id` current and load its messages
    ///
    /// Messages come back most recent first and are installed oldest first.
    /// Any messages in the log, pending ones included, are discarded.
    pub async fn load_session_history(
        &self,
        session_id: &RecordId,
    ) -> Result<(Session, Vec<Message>)> {
        let generation = self
            .state
            .update(|s| s.activate(session_id.clone(), false))
            .await;
        self.fetch_into(session_id, generation).await
    }

    /// Fetch history for a log already bound to `session_id` at `generation`
    ///
    /// Marks one loading operation; callers must not have counted it. Runs
    /// detached from the caller like `load_session_list`.
    pub(crate) async fn fetch_into(
        &self,
        session_id: &RecordId,
        generation: u64,
    ) -> Result<(Session, Vec<Message>)> {
        let task = tokio::spawn(fetch_history(
            self.api.clone(),
            self.state.clone(),
            self.page,
            session_id.clone(),
            generation,
        ));
        task.await?
    }
}

async fn refresh_session_list(
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
    page: HistoryQuery,
) -> Result<Vec<Session>> {
    state.update(|s| s.loading += 1).await;
    let result = api.list_sessions(page).await;

    match result {
        Ok(data) => {
            let sessions = data.sessions;
            state
                .update(|s| {
                    s.loading = s.loading.saturating_sub(1);
                    s.sessions.replace_all(sessions.clone());
                })
                .await;
            info!(count = sessions.len(), "Session list loaded");
            Ok(sessions)
        }
        Err(e) => {
            state
                .update(|s| s.loading = s.loading.saturating_sub(1))
                .await;
            warn!(error = %e, "Failed to load session list");
            Err(e)
        }
    }
}

async fn fetch_history(
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
    page: HistoryQuery,
    session_id: RecordId,
    generation: u64,
) -> Result<(Session, Vec<Message>)> {
    state.update(|s| s.loading += 1).await;
    debug!(session_id = %session_id, generation, "Fetching session history");

    let result = api.session_history(&session_id, page).await;

    let data = match result {
        Ok(data) => data,
        Err(e) => {
            state
                .update(|s| s.loading = s.loading.saturating_sub(1))
                .await;
            warn!(session_id = %session_id, error = %e, "Failed to load session history");
            return Err(e);
        }
    };

    let session = data.session;
    let mut messages: Vec<Message> = data
        .messages
        .into_iter()
        .map(|record| record.into_message())
        .collect();
    messages.reverse();

    let installed = state
        .update(|s| {
            s.loading = s.loading.saturating_sub(1);
            let still_current = s.sessions.current_id() == Some(&session_id)
                && s.log.generation() == generation;
            if still_current {
                s.sessions.upsert(session.clone());
                s.log.install_history(messages.clone());
            }
            still_current
        })
        .await;

    if installed {
        info!(
            session_id = %session_id,
            message_count = messages.len(),
            "Session history installed"
        );
    } else {
        warn!(
            session_id = %session_id,
            "Discarding history for a session that is no longer current"
        );
    }

    Ok((session, messages))
}
