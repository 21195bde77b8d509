use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::{Message, MessageId};

/// Why a submission produced no provisional message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("a send is already in flight for this conversation")]
    InFlight,
    #[error("identical message was just sent")]
    Duplicate,
}

#[derive(Debug, Default)]
struct EchoState {
    in_flight: bool,
    last_submission: Option<(String, DateTime<Utc>)>,
    outstanding: Vec<Message>,
}

/// Local echoes of operator sends, per conversation
#[derive(Debug)]
pub struct OptimisticEchoTracker {
    resubmit_window: Duration,
    conversations: HashMap<String, EchoState>,
}

impl OptimisticEchoTracker {
    pub fn new(resubmit_window: Duration) -> Self {
        Self { resubmit_window, conversations: HashMap::new() }
    }

    /// Accept a submission and mint its provisional message
    ///
    /// The literal content is kept on the message; only the duplicate check
    /// compares trimmed text.
    pub fn begin_send(
        &mut self,
        conversation_id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Message, SendRejected> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SendRejected::Empty);
        }

        let state = self.conversations.entry(conversation_id.to_string()).or_default();
        if state.in_flight {
            return Err(SendRejected::InFlight);
        }
        if let Some((last, at)) = &state.last_submission
            && last == trimmed
            && now - *at < self.resubmit_window
        {
            return Err(SendRejected::Duplicate);
        }

        let provisional = Message::provisional(conversation_id, content, now);
        state.in_flight = true;
        state.last_submission = Some((trimmed.to_string(), now));
        state.outstanding.push(provisional.clone());
        Ok(provisional)
    }

    /// Mark the in-flight send finished
    ///
    /// The provisional entry stays either way. A failure forgets the last
    /// submission so the same text can be retried at once.
    pub fn finish_send(&mut self, conversation_id: &str, succeeded: bool) {
        if let Some(state) = self.conversations.get_mut(conversation_id) {
            state.in_flight = false;
            if !succeeded {
                state.last_submission = None;
            }
        }
    }

    pub fn is_in_flight(&self, conversation_id: &str) -> bool {
        self.conversations.get(conversation_id).is_some_and(|state| state.in_flight)
    }

    pub fn outstanding(&self, conversation_id: &str) -> &[Message] {
        self.conversations
            .get(conversation_id)
            .map(|state| state.outstanding.as_slice())
            .unwrap_or_default()
    }

    /// Forget provisionals that no longer appear in the visible transcript
    pub fn retain_visible(&mut self, conversation_id: &str, visible: &[Message]) {
        let Some(state) = self.conversations.get_mut(conversation_id) else {
            return;
        };
        if state.outstanding.is_empty() {
            return;
        }
        let visible_ids: Vec<&MessageId> =
            visible.iter().filter(|msg| msg.is_provisional()).map(|msg| &msg.id).collect();
        state.outstanding.retain(|msg| visible_ids.contains(&&msg.id));
    }
}
