use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Messaging provider a conversation originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationSource {
    /// Chat-id addressed (`15551234567@c.us`)
    GreenApi,
    /// Phone addressed (`whatsapp:+15551234567`)
    Twilio,
}

/// Addressing context for one transcript
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: String,
    pub source: ConversationSource,
}

impl ConversationRef {
    pub fn new(id: impl Into<String>, source: ConversationSource) -> Self {
        Self { id: id.into(), source }
    }

    /// Destination for the Send Endpoint, shaped by where the conversation came from
    pub fn send_target(&self) -> SendTarget {
        match self.source {
            ConversationSource::GreenApi => SendTarget::ChatId { chat_id: self.id.clone() },
            ConversationSource::Twilio => {
                let to = if self.id.starts_with("whatsapp:") {
                    self.id.clone()
                } else {
                    format!("whatsapp:{}", self.id)
                };
                SendTarget::Phone { to }
            }
        }
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            ConversationSource::GreenApi => write!(f, "green:{}", self.id),
            ConversationSource::Twilio => write!(f, "twilio:{}", self.id),
        }
    }
}

impl FromStr for ConversationRef {
    type Err = anyhow::Error;

    /// Parses `[green:|twilio:]<id>`; no prefix means green
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (source, id) = if let Some(rest) = s.strip_prefix("twilio:") {
            (ConversationSource::Twilio, rest)
        } else if let Some(rest) = s.strip_prefix("green:") {
            (ConversationSource::GreenApi, rest)
        } else {
            (ConversationSource::GreenApi, s)
        };

        if id.is_empty() {
            bail!("conversation id cannot be empty");
        }

        Ok(Self::new(id, source))
    }
}

/// The two request shapes accepted by the Send Endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget {
    ChatId { chat_id: String },
    Phone { to: String },
}

impl SendTarget {
    pub fn request_body(&self, text: &str) -> serde_json::Value {
        match self {
            SendTarget::ChatId { chat_id } => {
                serde_json::json!({ "chatId": chat_id, "message": text })
            }
            SendTarget::Phone { to } => serde_json::json!({ "to": to, "body": text }),
        }
    }
}
