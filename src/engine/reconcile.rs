//! Merge of the visible transcript, a fresh server snapshot, and outstanding local echoes.
//!
//! The backend assigns final ids, statuses and media only after a round trip. Replacing
//! the transcript wholesale on each poll would either erase a just-sent message or show
//! it twice, so the merge works in three steps:
//!
//! 1. Union of previous and snapshot entries keyed by id; the server copy overwrites a
//!    previous entry with the same id, except that an estimated timestamp never replaces
//!    a known one.
//! 2. Every provisional entry with a near-match in the snapshot (same direction, equal
//!    normalized content, timestamps within the confirm window) is dropped. Each server
//!    entry confirms at most one provisional.
//! 3. Stable sort by timestamp, ascending.

use std::collections::{HashMap, HashSet};

use super::normalize::normalize_content;
use crate::config::ReconcileConfig;
use crate::models::{Message, MessageId};

pub fn reconcile(
    previous: &[Message],
    snapshot: &[Message],
    outstanding: &[Message],
    config: &ReconcileConfig,
) -> Vec<Message> {
    let mut order: Vec<MessageId> = Vec::with_capacity(previous.len() + snapshot.len());
    let mut by_id: HashMap<MessageId, Message> = HashMap::with_capacity(order.capacity());

    for msg in previous.iter().chain(outstanding) {
        if !by_id.contains_key(&msg.id) {
            order.push(msg.id.clone());
            by_id.insert(msg.id.clone(), msg.clone());
        }
    }

    for server in snapshot {
        match by_id.get_mut(&server.id) {
            Some(existing) => {
                let mut incoming = server.clone();
                if incoming.timestamp_estimated {
                    incoming.timestamp = existing.timestamp;
                    incoming.timestamp_estimated = existing.timestamp_estimated;
                }
                *existing = incoming;
            }
            None => {
                order.push(server.id.clone());
                by_id.insert(server.id.clone(), server.clone());
            }
        }
    }

    let confirmed = confirmed_provisionals(&order, &by_id, snapshot, config);

    let mut merged: Vec<Message> = order
        .into_iter()
        .filter(|id| !confirmed.contains(id))
        .filter_map(|id| by_id.remove(&id))
        .collect();
    merged.sort_by_key(|msg| msg.timestamp);
    merged
}

/// Ids of provisional entries the snapshot now represents
fn confirmed_provisionals(
    order: &[MessageId],
    by_id: &HashMap<MessageId, Message>,
    snapshot: &[Message],
    config: &ReconcileConfig,
) -> HashSet<MessageId> {
    let mut provisionals: Vec<&Message> = order
        .iter()
        .filter(|id| id.is_provisional())
        .filter_map(|id| by_id.get(id))
        .collect();
    if provisionals.is_empty() {
        return HashSet::new();
    }
    provisionals.sort_by_key(|msg| msg.timestamp);

    let candidates: Vec<(&Message, String)> = snapshot
        .iter()
        .filter(|msg| !msg.is_provisional())
        .map(|msg| (msg, normalize_content(&msg.content, config.content_prefix_chars)))
        .collect();

    let window = config.confirm_window();
    let mut used: HashSet<&MessageId> = HashSet::new();
    let mut confirmed = HashSet::new();

    for local in provisionals {
        let local_content = normalize_content(&local.content, config.content_prefix_chars);

        let matched = candidates
            .iter()
            .filter(|(server, _)| !used.contains(&server.id))
            .filter(|(server, content)| {
                server.direction == local.direction
                    && server.conversation_id == local.conversation_id
                    && *content == local_content
                    && (server.timestamp - local.timestamp).abs() <= window
            })
            .min_by_key(|(server, _)| (server.timestamp - local.timestamp).abs());

        if let Some((server, _)) = matched {
            used.insert(&server.id);
            confirmed.insert(local.id.clone());
        }
    }

    confirmed
}
