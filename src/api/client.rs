//! Chat API client
//!
//! `ChatApi` is the seam between the conversation state machine and the
//! network. `HttpChatApi` implements it against the REST backend with a
//! shared `reqwest::Client` (connection pooling) and injected auth headers.

use crate::api::types::{
    Envelope, FeedbackRequest, HistoryQuery, MessageRecord, RenameSessionRequest,
    SendMessageRequest, SessionHistoryData, SessionListData, StartSessionRequest,
};
use crate::auth::AuthHeaderSource;
use crate::chat::models::{RecordId, Session};
use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::Arc;
use tracing::{debug, error};

/// Remote operations consumed by the conversation core
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /chat/start`
    async fn start_session(&self, request: &StartSessionRequest) -> Result<Session>;

    /// `POST /chat/message`
    async fn send_message(&self, request: &SendMessageRequest) -> Result<MessageRecord>;

    /// `GET /chat/history`
    async fn list_sessions(&self, query: HistoryQuery) -> Result<SessionListData>;

    /// `GET /chat/history?session_id=ID`
    async fn session_history(
        &self,
        session_id: &RecordId,
        query: HistoryQuery,
    ) -> Result<SessionHistoryData>;

    /// `DELETE /chat/session/{id}`
    async fn delete_session(&self, session_id: &RecordId) -> Result<()>;

    /// `PUT /chat/session/{id}/title`
    async fn rename_session(
        &self,
        session_id: &RecordId,
        request: &RenameSessionRequest,
    ) -> Result<()>;

    /// `POST /feedback/message/{id}`
    async fn submit_feedback(&self, message_id: &RecordId, request: &FeedbackRequest)
        -> Result<()>;
}

/// `ChatApi` over HTTP
pub struct HttpChatApi {
    client: reqwest::Client,
    config: ClientConfig,
    auth: Arc<dyn AuthHeaderSource>,
}

impl HttpChatApi {
    /// Build a client with its own connection pool
    ///
    /// # Errors
    /// * Returns `ChatError::Remote` if the HTTP client cannot be constructed
    pub fn new(config: ClientConfig, auth: Arc<dyn AuthHeaderSource>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self::with_client(client, config, auth))
    }

    /// Reuse an existing `reqwest::Client`
    pub fn with_client(
        client: reqwest::Client,
        config: ClientConfig,
        auth: Arc<dyn AuthHeaderSource>,
    ) -> Self {
        Self {
            client,
            config,
            auth,
        }
    }

    /// Send a request and unwrap the response envelope
    ///
    /// HTTP failure status and `success: false` are reported identically as
    /// `ChatError::Api`, carrying `error.message` or `fallback`.
    async fn execute<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<Option<T>> {
        for (name, value) in self.auth.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Chat API request failed");
            ChatError::Remote(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Remote(format!("Failed to read response body: {}", e)))?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                error!(
                    status_code = status.as_u16(),
                    "Chat API returned error status with unparseable body"
                );
                return Err(ChatError::Api {
                    status: Some(status.as_u16()),
                    code: None,
                    message: fallback.to_string(),
                });
            }
            Err(e) => {
                return Err(ChatError::Remote(format!(
                    "Failed to parse JSON response: {}",
                    e
                )));
            }
        };

        if !status.is_success() || !envelope.success {
            let details = envelope.error.unwrap_or_default();
            error!(
                status_code = status.as_u16(),
                code = details.code.as_deref().unwrap_or("-"),
                "Chat API rejected request"
            );
            return Err(ChatError::Api {
                status: Some(status.as_u16()),
                code: details.code,
                message: details.message.unwrap_or_else(|| fallback.to_string()),
            });
        }

        Ok(envelope.data)
    }

    async fn execute_data<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        self.execute(request, fallback)
            .await?
            .ok_or_else(|| ChatError::Remote("Response envelope contains no data".to_string()))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn start_session(&self, request: &StartSessionRequest) -> Result<Session> {
        let url = self.config.endpoint("/chat/start");
        debug!(url = %url, "Starting chat session");
        self.execute_data(
            self.client.post(&url).json(request),
            "Failed to start chat session",
        )
        .await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<MessageRecord> {
        let url = self.config.endpoint("/chat/message");
        debug!(
            session_id = %request.session_id,
            message_len = request.message.len(),
            language = %request.language,
            "Sending chat message"
        );
        self.execute_data(self.client.post(&url).json(request), "Failed to send message")
            .await
    }

    async fn list_sessions(&self, query: HistoryQuery) -> Result<SessionListData> {
        let url = self.config.endpoint("/chat/history");
        debug!(url = %url, "Loading session list");
        self.execute_data(
            self.client.get(&url).query(&query),
            "Failed to load chat history",
        )
        .await
    }

    async fn session_history(
        &self,
        session_id: &RecordId,
        query: HistoryQuery,
    ) -> Result<SessionHistoryData> {
        let url = self.config.endpoint("/chat/history");
        debug!(session_id = %session_id, "Loading session history");
        self.execute_data(
            self.client
                .get(&url)
                .query(&[("session_id", session_id.to_string())])
                .query(&query),
            "Failed to load chat history",
        )
        .await
    }

    async fn delete_session(&self, session_id: &RecordId) -> Result<()> {
        let url = self.config.endpoint(&format!("/chat/session/{}", session_id));
        debug!(session_id = %session_id, "Deleting chat session");
        self.execute::<IgnoredAny>(self.client.delete(&url), "Failed to delete session")
            .await
            .map(|_| ())
    }

    async fn rename_session(
        &self,
        session_id: &RecordId,
        request: &RenameSessionRequest,
    ) -> Result<()> {
        let url = self
            .config
            .endpoint(&format!("/chat/session/{}/title", session_id));
        debug!(session_id = %session_id, "Renaming chat session");
        self.execute::<IgnoredAny>(
            self.client.put(&url).json(request),
            "Failed to update session title",
        )
        .await
        .map(|_| ())
    }

    async fn submit_feedback(
        &self,
        message_id: &RecordId,
        request: &FeedbackRequest,
    ) -> Result<()> {
        let url = self
            .config
            .endpoint(&format!("/feedback/message/{}", message_id));
        debug!(
            message_id = %message_id,
            rating = request.rating.value(),
            "Submitting message feedback"
        );
        self.execute::<IgnoredAny>(
            self.client.post(&url).json(request),
            "Failed to submit feedback",
        )
        .await
        .map(|_| ())
    }
}
