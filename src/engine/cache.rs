use std::collections::HashMap;

use crate::models::Message;

/// Last reconciled transcript per conversation, kept for the whole session
///
/// Read when switching to a conversation so it renders before the next fetch
/// lands; written on every successful cycle. Fetch failures never touch it.
#[derive(Debug, Default)]
pub struct TranscriptCache {
    entries: HashMap<String, Vec<Message>>,
}

impl TranscriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conversation_id: &str) -> Option<&[Message]> {
        self.entries.get(conversation_id).map(Vec::as_slice)
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.entries.contains_key(conversation_id)
    }

    pub fn store(&mut self, conversation_id: impl Into<String>, messages: Vec<Message>) {
        self.entries.insert(conversation_id.into(), messages);
    }

    /// Drop one conversation's transcript on explicit navigation away
    pub fn evict(&mut self, conversation_id: &str) -> Option<Vec<Message>> {
        self.entries.remove(conversation_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
