//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use inbox_transcript::client::{ApiError, MessageApi};
use inbox_transcript::models::{
    ConversationRef, DeliveryStatus, Direction, MediaType, Message, MessageId, SendTarget,
};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

/// Fixed reference instant so bucket and window arithmetic is predictable
pub fn base_time() -> DateTime<Utc> {
    // Divisible by 3s, so offsets under 3s share a dedup bucket
    Utc.timestamp_opt(1_700_000_001, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(secs)
}

/// Builder for engine-level `Message` values
pub struct MessageBuilder {
    msg: Message,
}

impl MessageBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            msg: Message {
                id: MessageId::new(id),
                conversation_id: "c1".to_string(),
                content: "Test message".to_string(),
                timestamp: base_time(),
                direction: Direction::Inbound,
                status: None,
                media_url: None,
                media_type: None,
                timestamp_estimated: false,
            },
        }
    }

    /// Provisional echo as the tracker would mint it
    pub fn provisional(content: &str, timestamp: DateTime<Utc>) -> Self {
        Self { msg: Message::provisional("c1", content, timestamp) }
    }

    pub fn content(mut self, content: &str) -> Self {
        self.msg.content = content.to_string();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.msg.timestamp = timestamp;
        self
    }

    pub fn outbound(mut self) -> Self {
        self.msg.direction = Direction::Outbound;
        self
    }

    pub fn status(mut self, status: DeliveryStatus) -> Self {
        self.msg.status = Some(status);
        self
    }

    pub fn media(mut self, url: &str, media_type: MediaType) -> Self {
        self.msg.media_url = Some(url.to_string());
        self.msg.media_type = Some(media_type);
        self
    }

    pub fn build(self) -> Message {
        self.msg
    }
}

/// Builder for raw backend records, in the backend's own field spellings
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new(id: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("body".to_string(), json!("Test message"));
        fields.insert("timestamp".to_string(), json!(base_time().timestamp()));
        fields.insert("fromMe".to_string(), json!(false));
        Self { fields }
    }

    pub fn body(self, body: &str) -> Self {
        self.field("body", json!(body))
    }

    /// Unix seconds, as most webhook payloads carry them
    pub fn at(self, timestamp: DateTime<Utc>) -> Self {
        self.field("timestamp", json!(timestamp.timestamp()))
    }

    pub fn outbound(self) -> Self {
        self.field("fromMe", json!(true))
    }

    pub fn status(self, status: &str) -> Self {
        self.field("status", json!(status))
    }

    pub fn media(self, url: &str) -> Self {
        self.field("mediaUrl", json!(url))
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// `{"messages": [...]}` listing body
pub fn listing(records: Vec<RecordBuilder>) -> Value {
    json!({ "messages": records.into_iter().map(RecordBuilder::build).collect::<Vec<_>>() })
}

/// One scripted listing response
#[derive(Debug, Clone)]
pub enum Reply {
    Body(Value),
    /// HTTP failure with this status
    Fail(u16),
    /// Never answers; resolves only through cancellation
    Hang,
}

/// Scripted `MessageApi`: replies are served in order and the last one repeats
pub struct ScriptedApi {
    replies: Mutex<VecDeque<Reply>>,
    send_failure: Mutex<Option<u16>>,
    sent: Mutex<Vec<(SendTarget, String)>>,
    pub lists: AtomicUsize,
    pub resyncs: AtomicUsize,
    pub sends: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            send_failure: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            lists: AtomicUsize::new(0),
            resyncs: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
        }
    }

    /// Replace whatever is left of the script
    pub fn script(&self, replies: Vec<Reply>) {
        *self.replies.lock().unwrap() = replies.into();
    }

    /// Make every following send fail with `status`
    pub fn fail_sends(&self, status: u16) {
        *self.send_failure.lock().unwrap() = Some(status);
    }

    pub fn sent(&self) -> Vec<(SendTarget, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn resync_count(&self) -> usize {
        self.resyncs.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or(Reply::Body(json!([])))
        }
    }
}

#[async_trait]
impl MessageApi for ScriptedApi {
    async fn list_messages(
        &self,
        _conversation: &ConversationRef,
        token: CancellationToken,
    ) -> Result<Value, ApiError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        match self.next_reply() {
            Reply::Body(body) => Ok(body),
            Reply::Fail(status) => Err(ApiError::from_status(status, "scripted".to_string())),
            Reply::Hang => {
                token.cancelled().await;
                Err(ApiError::Cancelled)
            }
        }
    }

    async fn send_message(&self, target: &SendTarget, text: &str) -> Result<(), ApiError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((target.clone(), text.to_string()));
        match *self.send_failure.lock().unwrap() {
            Some(status) => Err(ApiError::from_status(status, "scripted".to_string())),
            None => Ok(()),
        }
    }

    async fn resync(&self, _conversation: &ConversationRef) -> Result<(), ApiError> {
        self.resyncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
