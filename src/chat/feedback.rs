//! Message feedback
//!
//! Attaches a rating and optional comment to a confirmed message.

use crate::api::client::ChatApi;
use crate::api::types::FeedbackRequest;
use crate::chat::models::{Feedback, MessageId, Rating};
use crate::error::{ChatError, Result};
use crate::state::SharedState;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Records user feedback on answers
pub struct FeedbackRecorder {
    api: Arc<dyn ChatApi>,
    state: Arc<SharedState>,
}

impl FeedbackRecorder {
    /// Create a recorder over shared state
    pub fn new(api: Arc<dyn ChatApi>, state: Arc<SharedState>) -> Self {
        Self { api, state }
    }

    /// Rate a confirmed message in the current log
    ///
    /// # Errors
    /// * `ChatError::Validation` if the message is unknown or still pending
    /// * `ChatError::Remote` / `ChatError::Api` if the server call fails;
    ///   the log is left unchanged
    pub async fn submit_feedback(
        &self,
        message_id: &MessageId,
        rating: Rating,
        comment: Option<&str>,
    ) -> Result<()> {
        let server_id = self
            .state
            .read(|s| match s.log.get(message_id) {
                None => Err(ChatError::validation(format!(
                    "Message not found: {}",
                    message_id
                ))),
                Some(message) => message.server_id().cloned().ok_or_else(|| {
                    ChatError::validation("Cannot rate a message that is still pending")
                }),
            })
            .await?;

        let comment = comment.map(str::trim).unwrap_or_default().to_string();
        let request = FeedbackRequest {
            rating,
            comment: comment.clone(),
        };

        if let Err(e) = self.api.submit_feedback(&server_id, &request).await {
            warn!(message_id = %server_id, error = %e, "Failed to submit feedback");
            return Err(e);
        }

        let feedback = Feedback {
            rating,
            comment: Some(comment).filter(|c| !c.is_empty()),
        };
        let applied = self
            .state
            .update(|s| s.log.set_feedback(&server_id, feedback))
            .await;

        if applied {
            info!(message_id = %server_id, rating = rating.value(), "Feedback recorded");
        } else {
            debug!(
                message_id = %server_id,
                "Feedback accepted for a message no longer in the log"
            );
        }
        Ok(())
    }
}
