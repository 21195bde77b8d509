use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::error::ApiError;
use crate::models::{ConversationRef, SendTarget};

/// Backend collaborator for one inbox
///
/// Listing returns the raw JSON body; decoding it is the parsers' job so any
/// backend shape reaches the same defensive mapping.
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Fetch the authoritative message list; must return `ApiError::Cancelled`
    /// once `token` fires
    async fn list_messages(
        &self,
        conversation: &ConversationRef,
        token: CancellationToken,
    ) -> Result<Value, ApiError>;

    async fn send_message(&self, target: &SendTarget, text: &str) -> Result<(), ApiError>;

    /// Ask the backend to rebuild its index for `conversation`
    async fn resync(&self, conversation: &ConversationRef) -> Result<(), ApiError>;
}
