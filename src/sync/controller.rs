use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::fetcher::{FetchFuture, FetchOutcome, SnapshotFetcher};
use crate::client::MessageApi;
use crate::config::SyncConfig;
use crate::engine::{Change, ChangeDetector};
use crate::models::{ConversationRef, Message};

/// Await the future in `slot` if there is one, otherwise never resolve
///
/// Lets optional timers and fetches sit in a `select!` branch; the slot is
/// polled by reference so losing a race does not drop it.
pub(crate) async fn resolve_slot<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

/// Poll state for the one conversation on screen, discarded on switch
///
/// Lifecycle is [`ConversationController::start`] then
/// [`ConversationController::stop`]; a stopped controller never fetches again.
pub struct ConversationController {
    conversation: ConversationRef,
    token: CancellationToken,
    fetcher: SnapshotFetcher,
    interval: Interval,
    in_flight: Option<FetchFuture>,
    followup: Option<Pin<Box<Sleep>>>,
    followup_delay: Duration,
    /// Whether the conversation has a cached transcript yet
    loaded: bool,
    visible: Vec<Message>,
    detector: ChangeDetector,
}

impl ConversationController {
    /// Seed from the cached transcript (if any) and arm the poll timer
    ///
    /// The first tick fires immediately, so the first fetch starts on the
    /// next call to [`ConversationController::next_outcome`].
    pub fn start(
        conversation: ConversationRef,
        api: Arc<dyn MessageApi>,
        cached: Option<&[Message]>,
        config: &SyncConfig,
        parent: &CancellationToken,
    ) -> Self {
        let token = parent.child_token();
        let fetcher = SnapshotFetcher::new(
            api,
            conversation.clone(),
            token.clone(),
            config.resync_retry_delay(),
        );

        let mut interval = tokio::time::interval(config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let visible = cached.map(<[Message]>::to_vec).unwrap_or_default();
        let mut detector = ChangeDetector::new();
        if cached.is_some() {
            detector.observe(&visible);
        }

        debug!(conversation = %conversation, cached = cached.is_some(), "Controller started");
        Self {
            conversation,
            token,
            fetcher,
            interval,
            in_flight: None,
            followup: None,
            followup_delay: config.followup_delay(),
            loaded: cached.is_some(),
            visible,
            detector,
        }
    }

    /// Cancel the poll loop and any fetch in flight
    pub fn stop(&mut self) {
        debug!(conversation = %self.conversation, "Controller stopped");
        self.token.cancel();
        self.fetcher.cancel();
        self.in_flight = None;
        self.followup = None;
    }

    pub fn conversation(&self) -> &ConversationRef {
        &self.conversation
    }

    pub fn visible(&self) -> &[Message] {
        &self.visible
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive ticks and follow-ups until a fetch completes
    ///
    /// Cancel safe: the in-flight fetch and the follow-up timer live on `self`.
    pub async fn next_outcome(&mut self) -> FetchOutcome {
        loop {
            tokio::select! {
                outcome = resolve_slot(&mut self.in_flight) => {
                    self.in_flight = None;
                    return outcome;
                }
                _ = self.interval.tick() => self.on_tick(),
                _ = resolve_slot(&mut self.followup) => {
                    self.followup = None;
                    self.refresh();
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if self.is_stopped() {
            return;
        }
        if let Some(fut) = self.fetcher.try_start(!self.loaded) {
            self.in_flight = Some(fut);
        }
    }

    /// Fetch now, superseding any fetch in flight
    pub fn refresh(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.in_flight = Some(self.fetcher.restart(!self.loaded));
    }

    /// One fetch shortly after a successful send, to pick up the confirmed record
    pub fn schedule_followup(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.followup = Some(Box::pin(tokio::time::sleep(self.followup_delay)));
    }

    /// Accept an outcome only if it is the newest generation
    pub fn settle(&mut self, outcome: &FetchOutcome) -> bool {
        !self.is_stopped() && self.fetcher.finish(outcome.generation)
    }

    /// Replace the visible transcript and report whether it differs from the last render
    pub fn update_visible(&mut self, messages: Vec<Message>) -> Change {
        self.loaded = true;
        let change = self.detector.observe(&messages);
        self.visible = messages;
        change
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
