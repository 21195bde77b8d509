use std::collections::HashMap;

use super::normalize::normalize_content;
use crate::config::ReconcileConfig;
use crate::models::{DeliveryStatus, Direction, Message};

/// Messages sharing a key are the same real-world message
#[derive(Debug, PartialEq, Eq, Hash)]
struct DedupKey {
    conversation_id: String,
    direction: Direction,
    content: String,
    bucket: i64,
}

impl DedupKey {
    fn of(msg: &Message, config: &ReconcileConfig) -> Self {
        Self {
            conversation_id: msg.conversation_id.clone(),
            direction: msg.direction,
            content: normalize_content(&msg.content, config.content_prefix_chars),
            bucket: msg.timestamp.timestamp_millis().div_euclid(config.dedup_bucket_millis()),
        }
    }
}

/// Information completeness, compared lexicographically:
/// status first, then media presence, then server-confirmed id
fn score(msg: &Message) -> (Option<DeliveryStatus>, bool, bool) {
    (msg.status, msg.has_media(), !msg.is_provisional())
}

/// Collapse records that describe the same message under different ids
///
/// Groups by conversation, direction, normalized content and time bucket, and keeps the
/// highest-scoring record of each group. Ties keep the earliest-seen record. The
/// result is re-sorted by timestamp since a later winner may carry a later timestamp.
pub fn deduplicate(messages: Vec<Message>, config: &ReconcileConfig) -> Vec<Message> {
    let mut kept: Vec<Message> = Vec::with_capacity(messages.len());
    let mut slots: HashMap<DedupKey, usize> = HashMap::with_capacity(messages.len());

    for msg in messages {
        let key = DedupKey::of(&msg, config);
        match slots.get(&key) {
            Some(&slot) => {
                if score(&msg) > score(&kept[slot]) {
                    kept[slot] = msg;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(msg);
            }
        }
    }

    kept.sort_by_key(|msg| msg.timestamp);
    kept
}
