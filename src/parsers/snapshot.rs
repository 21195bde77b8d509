use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::deserializers::{
    first_field, id_of, parse_direction, parse_media_type, parse_status, parse_timestamp, text_of,
};
use crate::models::{Direction, MediaType, Message, MessageId};

const ARRAY_KEYS: &[&str] = &["messages", "data", "items", "results", "records"];
const MAX_WRAPPER_DEPTH: usize = 3;

const ID_FIELDS: &[&str] = &["id", "_id", "messageId", "message_id", "idMessage", "sid"];
const CONTENT_FIELDS: &[&str] = &["content", "body", "text", "message", "textMessage", "caption"];
const TIMESTAMP_FIELDS: &[&str] = &[
    "timestamp",
    "createdAt",
    "created_at",
    "sentAt",
    "sent_at",
    "dateCreated",
    "date_created",
    "date",
    "time",
];
const STATUS_FIELDS: &[&str] =
    &["status", "deliveryStatus", "delivery_status", "statusMessage", "ack"];
const MEDIA_URL_FIELDS: &[&str] = &["mediaUrl", "media_url", "downloadUrl", "urlFile"];
const MEDIA_TYPE_FIELDS: &[&str] = &["mediaType", "media_type", "typeMessage", "mimeType"];

/// Decode one Message Listing Endpoint response into transcript entries
///
/// The record array may be the body itself or nested under a wrapper key
/// (`{"data": {"messages": [...]}}`). Records with missing fields are
/// defaulted rather than dropped; entries that are not JSON objects are
/// skipped with a warning.
pub fn parse_snapshot(body: &Value, conversation_id: &str, now: DateTime<Utc>) -> Vec<Message> {
    let Some(records) = locate_records(body, 0) else {
        warn!(conversation = conversation_id, "No message array found in listing response");
        return Vec::new();
    };

    let mut messages = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match record.as_object() {
            Some(obj) => messages.push(parse_record(obj, conversation_id, now)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            conversation = conversation_id,
            skipped,
            parsed = messages.len(),
            "Skipped non-object entries in listing response"
        );
    }

    messages
}

fn locate_records(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    match value {
        Value::Array(records) => Some(records),
        Value::Object(obj) if depth < MAX_WRAPPER_DEPTH => ARRAY_KEYS
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(|inner| locate_records(inner, depth + 1)),
        _ => None,
    }
}

/// Map one raw record onto a [`Message`], defaulting whatever is missing
pub fn parse_record(
    record: &Map<String, Value>,
    conversation_id: &str,
    now: DateTime<Utc>,
) -> Message {
    let direction = parse_direction(record);
    let content = first_field(record, CONTENT_FIELDS).and_then(text_of).unwrap_or_default();

    let raw_timestamp = first_field(record, TIMESTAMP_FIELDS);
    let parsed_timestamp = raw_timestamp.and_then(parse_timestamp);
    let timestamp_estimated = parsed_timestamp.is_none();
    if timestamp_estimated {
        debug!(conversation = conversation_id, "Record has no usable timestamp, using now");
    }

    let id = match first_field(record, ID_FIELDS).and_then(id_of) {
        Some(id) => MessageId::new(id),
        None => synthetic_id(direction, &content, raw_timestamp),
    };

    let status = first_field(record, STATUS_FIELDS).and_then(parse_status);

    let media = record.get("media").and_then(Value::as_object);
    let media_url = first_field(record, MEDIA_URL_FIELDS)
        .or_else(|| media.and_then(|m| m.get("url")))
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string);
    let media_type = media_url.as_ref().map(|_| {
        first_field(record, MEDIA_TYPE_FIELDS)
            .or_else(|| media.and_then(|m| m.get("type")))
            .and_then(Value::as_str)
            .map(parse_media_type)
            .unwrap_or(MediaType::Other)
    });

    Message {
        id,
        conversation_id: conversation_id.to_string(),
        content,
        timestamp: parsed_timestamp.unwrap_or(now),
        direction,
        status,
        media_url,
        media_type,
        timestamp_estimated,
    }
}

/// Stable identity for records the backend sent without an id
fn synthetic_id(direction: Direction, content: &str, raw_timestamp: Option<&Value>) -> MessageId {
    let mut hasher = DefaultHasher::new();
    direction.hash(&mut hasher);
    content.hash(&mut hasher);
    raw_timestamp.map(Value::to_string).unwrap_or_default().hash(&mut hasher);
    MessageId::new(format!("anon-{:016x}", hasher.finish()))
}
