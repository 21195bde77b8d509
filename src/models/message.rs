use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix carried by every locally minted (unconfirmed) message id
pub const PROVISIONAL_ID_PREFIX: &str = "local-";

/// Transcript entry identifier, either server-assigned or provisional
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a provisional id: `local-<unix millis>-<8 hex chars>`
    pub fn provisional(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}-{}", PROVISIONAL_ID_PREFIX, now.timestamp_millis(), &suffix[..8]))
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the operator
    Outbound,
    /// Sent by the customer
    Inbound,
}

/// Delivery confidence, ordered `Sent < Delivered < Read`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    /// Set when the record had no usable timestamp and "now" was substituted
    #[serde(skip)]
    pub timestamp_estimated: bool,
}

impl Message {
    /// Build the local echo shown the instant the operator presses send
    pub fn provisional(
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::provisional(now),
            conversation_id: conversation_id.into(),
            content: content.into(),
            timestamp: now,
            direction: Direction::Outbound,
            status: Some(DeliveryStatus::Sent),
            media_url: None,
            media_type: None,
            timestamp_estimated: false,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }

    pub fn has_media(&self) -> bool {
        self.media_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}
