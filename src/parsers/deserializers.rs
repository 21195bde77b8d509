use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{DeliveryStatus, Direction, MediaType};

/// Numbers below this are Unix seconds, at or above it Unix milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Return the first present, non-null field among `aliases`
pub fn first_field<'a>(record: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().filter_map(|key| record.get(*key)).find(|value| !value.is_null())
}

/// Accepts Unix seconds or milliseconds (number or numeric string), RFC3339 or RFC2822
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let raw = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            from_unix(raw)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(raw) = s.parse::<i64>() {
                return from_unix(raw);
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            // Twilio reports dateCreated as RFC2822
            DateTime::parse_from_rfc2822(s).ok().map(|ts| ts.with_timezone(&Utc))
        }
        _ => None,
    }
}

fn from_unix(raw: i64) -> Option<DateTime<Utc>> {
    if raw.abs() < MILLIS_THRESHOLD {
        DateTime::from_timestamp(raw, 0)
    } else {
        DateTime::from_timestamp_millis(raw)
    }
}

/// Map the backend's status vocabulary (or a numeric WhatsApp ack) onto [`DeliveryStatus`]
pub fn parse_status(value: &Value) -> Option<DeliveryStatus> {
    match value {
        Value::Number(n) => match n.as_i64()? {
            1 => Some(DeliveryStatus::Sent),
            2 => Some(DeliveryStatus::Delivered),
            n if n >= 3 => Some(DeliveryStatus::Read),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" | "accepted" | "sending" | "sent" => Some(DeliveryStatus::Sent),
            "delivered" => Some(DeliveryStatus::Delivered),
            "read" | "seen" | "played" | "viewed" => Some(DeliveryStatus::Read),
            _ => None,
        },
        _ => None,
    }
}

fn direction_from_str(s: &str) -> Option<Direction> {
    match s.trim().to_ascii_lowercase().as_str() {
        "outbound" | "outgoing" | "out" | "sent" | "outbound-api" | "outbound-reply" => {
            Some(Direction::Outbound)
        }
        "inbound" | "incoming" | "in" | "received" => Some(Direction::Inbound),
        _ => None,
    }
}

/// Work out who sent a record; unknown indicators fall back to inbound
pub fn parse_direction(record: &Map<String, Value>) -> Direction {
    for key in ["direction", "type"] {
        if let Some(direction) =
            record.get(key).and_then(Value::as_str).and_then(direction_from_str)
        {
            return direction;
        }
    }

    if let Some(from_me) =
        first_field(record, &["fromMe", "from_me", "isFromMe", "outgoing"]).and_then(Value::as_bool)
    {
        return if from_me { Direction::Outbound } else { Direction::Inbound };
    }

    if let Some(sender) = record.get("sender").and_then(Value::as_str) {
        return match sender.trim().to_ascii_lowercase().as_str() {
            "operator" | "agent" | "business" | "me" => Direction::Outbound,
            _ => Direction::Inbound,
        };
    }

    Direction::Inbound
}

pub fn parse_media_type(s: &str) -> MediaType {
    let lower = s.to_ascii_lowercase();
    if lower.contains("image") {
        MediaType::Image
    } else if lower.contains("video") {
        MediaType::Video
    } else {
        MediaType::Other
    }
}

/// Text from a plain string or an object carrying `body`/`text`
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => first_field(obj, &["body", "text"]).and_then(text_of),
        _ => None,
    }
}

/// Ids may arrive as strings or numbers
pub fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
