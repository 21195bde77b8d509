use super::dedup::deduplicate;
use super::reconcile::reconcile;
use crate::config::ReconcileConfig;
use crate::models::Message;

/// Keep only the newest `max` entries of a timestamp-sorted list
pub fn cap_to_newest(mut messages: Vec<Message>, max: usize) -> Vec<Message> {
    if messages.len() > max {
        let excess = messages.len() - max;
        messages.drain(..excess);
    }
    messages
}

/// One reconciliation cycle: merge, collapse duplicates, cap
#[derive(Debug, Clone, Default)]
pub struct TranscriptPipeline {
    config: ReconcileConfig,
}

impl TranscriptPipeline {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn run(
        &self,
        previous: &[Message],
        snapshot: &[Message],
        outstanding: &[Message],
    ) -> Vec<Message> {
        let merged = reconcile(previous, snapshot, outstanding, &self.config);
        let deduped = deduplicate(merged, &self.config);
        cap_to_newest(deduped, self.config.max_messages)
    }
}
