use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::Message;

/// Cheap fingerprint of what a transcript would render
///
/// Hashes the ordered `(id, timestamp, status)` of every entry, plus whether it
/// carries media so a record that gains an attachment is seen as a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranscriptSignature(u64);

impl TranscriptSignature {
    pub fn of(messages: &[Message]) -> Self {
        let mut hasher = DefaultHasher::new();
        messages.len().hash(&mut hasher);
        for msg in messages {
            msg.id.hash(&mut hasher);
            msg.timestamp.timestamp_millis().hash(&mut hasher);
            msg.status.hash(&mut hasher);
            msg.has_media().hash(&mut hasher);
        }
        Self(hasher.finish())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Changed,
    Unchanged,
}

/// Remembers the last signature so identical polls skip render and scroll work
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<TranscriptSignature>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `messages` as the latest cycle and report whether it differs
    pub fn observe(&mut self, messages: &[Message]) -> Change {
        let signature = TranscriptSignature::of(messages);
        if self.last == Some(signature) {
            Change::Unchanged
        } else {
            self.last = Some(signature);
            Change::Changed
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
