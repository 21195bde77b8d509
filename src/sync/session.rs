//! The single event loop behind the transcript view.
//!
//! [`InboxSession`] owns the cache, the echo tracker and the active
//! controller, and is the only thing that mutates them. Callers talk to it
//! through a [`SessionHandle`]: commands in, events out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::controller::ConversationController;
use super::fetcher::FetchOutcome;
use crate::client::{ApiError, MessageApi};
use crate::config::{AppConfig, SyncConfig};
use crate::engine::{
    Change, OptimisticEchoTracker, SendRejected, TranscriptCache, TranscriptPipeline,
};
use crate::models::{ConversationRef, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Switch the view to `conversation`
    Select(ConversationRef),
    /// Send `text` to the active conversation
    Send(String),
    /// Fetch the active conversation now
    Refresh,
    /// Navigate away from the active conversation and drop its cached transcript
    Leave,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// New visible transcript; `force_scroll` asks the view to jump to the bottom
    Transcript { conversation_id: String, messages: Vec<Message>, force_scroll: bool },
    SendFailed { conversation_id: String, error: String },
    /// Poll failure; the transcript on screen is left as it was
    FetchFailed { conversation_id: String, error: String },
    SendRejected { reason: SendRejected },
}

/// The caller's side of a running session
pub struct SessionHandle {
    pub commands: mpsc::UnboundedSender<SessionCommand>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

#[derive(Debug)]
struct SendCompletion {
    conversation: ConversationRef,
    result: Result<(), ApiError>,
}

pub struct InboxSession {
    api: Arc<dyn MessageApi>,
    sync: SyncConfig,
    pipeline: TranscriptPipeline,
    cache: TranscriptCache,
    tracker: OptimisticEchoTracker,
    active: Option<ConversationController>,
    token: CancellationToken,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    sends_tx: mpsc::UnboundedSender<SendCompletion>,
    sends_rx: mpsc::UnboundedReceiver<SendCompletion>,
}

impl InboxSession {
    pub fn new(api: Arc<dyn MessageApi>, config: &AppConfig) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (sends_tx, sends_rx) = mpsc::unbounded_channel();

        let session = Self {
            api,
            sync: config.sync.clone(),
            pipeline: TranscriptPipeline::new(config.reconcile.clone()),
            cache: TranscriptCache::new(),
            tracker: OptimisticEchoTracker::new(config.echo.resubmit_window()),
            active: None,
            token: CancellationToken::new(),
            commands: command_rx,
            events: event_tx,
            sends_tx,
            sends_rx,
        };
        (session, SessionHandle { commands: command_tx, events: event_rx })
    }

    /// Run until `Shutdown` or until every command sender is dropped
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(done) = self.sends_rx.recv() => self.handle_send_completion(done),
                outcome = next_outcome(&mut self.active) => self.handle_outcome(outcome),
            }
        }

        if let Some(mut controller) = self.active.take() {
            controller.stop();
        }
        self.token.cancel();
        debug!("Session stopped");
    }

    fn emit(&self, event: SessionEvent) {
        // A closed receiver means the view is gone; the loop ends on its next command poll
        let _ = self.events.send(event);
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Select(conversation) => self.select(conversation),
            SessionCommand::Send(text) => self.send(&text),
            SessionCommand::Refresh => {
                if let Some(controller) = self.active.as_mut() {
                    controller.refresh();
                }
            }
            SessionCommand::Leave => {
                if let Some(mut controller) = self.active.take() {
                    controller.stop();
                    self.cache.evict(&controller.conversation().id);
                    info!(conversation = %controller.conversation(), "Left conversation");
                }
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn select(&mut self, conversation: ConversationRef) {
        if let Some(mut previous) = self.active.take() {
            previous.stop();
        }

        let cached = self.cache.get(&conversation.id);
        let messages = cached.map(<[Message]>::to_vec).unwrap_or_default();
        let controller = ConversationController::start(
            conversation.clone(),
            Arc::clone(&self.api),
            cached,
            &self.sync,
            &self.token,
        );
        self.active = Some(controller);

        info!(conversation = %conversation, cached = messages.len(), "Selected conversation");
        self.emit(SessionEvent::Transcript {
            conversation_id: conversation.id,
            messages,
            force_scroll: true,
        });
    }

    fn send(&mut self, text: &str) {
        let Some(controller) = self.active.as_mut() else {
            debug!("Send ignored, no active conversation");
            return;
        };
        let conversation = controller.conversation().clone();

        let provisional = match self.tracker.begin_send(&conversation.id, text, Utc::now()) {
            Ok(msg) => msg,
            Err(reason) => {
                debug!(conversation = %conversation, %reason, "Send rejected");
                self.emit(SessionEvent::SendRejected { reason });
                return;
            }
        };

        let merged = self.pipeline.run(
            controller.visible(),
            &[],
            std::slice::from_ref(&provisional),
        );
        controller.update_visible(merged.clone());
        self.cache.store(conversation.id.clone(), merged.clone());
        self.emit(SessionEvent::Transcript {
            conversation_id: conversation.id.clone(),
            messages: merged,
            force_scroll: true,
        });

        // Detached so a conversation switch never aborts a send the backend may already have
        let api = Arc::clone(&self.api);
        let done = self.sends_tx.clone();
        let content = provisional.content;
        tokio::spawn(async move {
            let result = api.send_message(&conversation.send_target(), &content).await;
            let _ = done.send(SendCompletion { conversation, result });
        });
    }

    fn handle_send_completion(&mut self, done: SendCompletion) {
        let SendCompletion { conversation, result } = done;
        self.tracker.finish_send(&conversation.id, result.is_ok());

        match result {
            Ok(()) => {
                debug!(conversation = %conversation, "Send accepted, scheduling follow-up fetch");
                if let Some(controller) = self.active.as_mut()
                    && controller.conversation() == &conversation
                {
                    controller.schedule_followup();
                }
            }
            Err(e) => {
                warn!(conversation = %conversation, "Send failed: {}", e);
                self.emit(SessionEvent::SendFailed {
                    conversation_id: conversation.id,
                    error: e.to_string(),
                });
            }
        }
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        let Some(controller) = self.active.as_mut() else {
            return;
        };
        let generation = outcome.generation;
        if !controller.settle(&outcome) {
            debug!(
                conversation = %controller.conversation(),
                generation,
                "Discarding superseded fetch"
            );
            return;
        }
        let conversation_id = controller.conversation().id.clone();

        let snapshot = match outcome.result {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_cancelled() => {
                debug!(conversation = %conversation_id, generation, "Fetch cancelled");
                return;
            }
            Err(e) => {
                warn!(conversation = %conversation_id, generation, "Fetch failed: {}", e);
                self.emit(SessionEvent::FetchFailed { conversation_id, error: e.to_string() });
                return;
            }
        };

        if snapshot.is_empty() && !outcome.first_load && controller.is_loaded() {
            debug!(
                conversation = %conversation_id,
                generation,
                "Empty poll, keeping cached transcript"
            );
            return;
        }

        let merged = self.pipeline.run(
            controller.visible(),
            &snapshot,
            self.tracker.outstanding(&conversation_id),
        );
        self.tracker.retain_visible(&conversation_id, &merged);
        self.cache.store(conversation_id.clone(), merged.clone());

        match controller.update_visible(merged.clone()) {
            Change::Unchanged => {
                debug!(conversation = %conversation_id, generation, "Transcript unchanged");
            }
            Change::Changed => {
                debug!(
                    conversation = %conversation_id,
                    generation,
                    count = merged.len(),
                    "Transcript changed"
                );
                self.emit(SessionEvent::Transcript {
                    conversation_id,
                    messages: merged,
                    force_scroll: false,
                });
            }
        }
    }
}

async fn next_outcome(active: &mut Option<ConversationController>) -> FetchOutcome {
    match active {
        Some(controller) => controller.next_outcome().await,
        None => std::future::pending().await,
    }
}
