use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ApiError, MessageApi};
use crate::models::{ConversationRef, Message};
use crate::parsers::parse_snapshot;

/// Result of one fetch, tagged with the generation that started it
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub first_load: bool,
    pub result: Result<Vec<Message>, ApiError>,
}

pub type FetchFuture = BoxFuture<'static, FetchOutcome>;

/// Single-flight, cancellable snapshot fetches for one conversation
///
/// Every started fetch gets a fresh generation and a child of the owner's
/// token. Only the newest generation is accepted by [`SnapshotFetcher::finish`].
pub struct SnapshotFetcher {
    api: Arc<dyn MessageApi>,
    conversation: ConversationRef,
    parent: CancellationToken,
    retry_delay: Duration,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl SnapshotFetcher {
    pub fn new(
        api: Arc<dyn MessageApi>,
        conversation: ConversationRef,
        parent: CancellationToken,
        retry_delay: Duration,
    ) -> Self {
        Self { api, conversation, parent, retry_delay, generation: 0, in_flight: None }
    }

    pub fn conversation(&self) -> &ConversationRef {
        &self.conversation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a fetch unless one is already running
    pub fn try_start(&mut self, first_load: bool) -> Option<FetchFuture> {
        if self.is_in_flight() {
            debug!(conversation = %self.conversation, "Fetch already in flight, skipping");
            return None;
        }
        Some(self.start(first_load))
    }

    /// Cancel whatever is in flight and start over
    pub fn restart(&mut self, first_load: bool) -> FetchFuture {
        self.cancel();
        self.start(first_load)
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Settle a completed fetch; `false` means it was superseded and must be ignored
    pub fn finish(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = None;
        true
    }

    fn start(&mut self, first_load: bool) -> FetchFuture {
        self.generation += 1;
        let generation = self.generation;
        let token = self.parent.child_token();
        self.in_flight = Some(token.clone());

        debug!(conversation = %self.conversation, generation, first_load, "Starting fetch");
        let api = Arc::clone(&self.api);
        let conversation = self.conversation.clone();
        let retry_delay = self.retry_delay;

        async move {
            let result = if first_load {
                fetch_first_load(api.as_ref(), &conversation, &token, retry_delay).await
            } else {
                fetch_once(api.as_ref(), &conversation, &token).await
            };
            FetchOutcome { generation, first_load, result }
        }
        .boxed()
    }
}

async fn fetch_once(
    api: &dyn MessageApi,
    conversation: &ConversationRef,
    token: &CancellationToken,
) -> Result<Vec<Message>, ApiError> {
    let body = api.list_messages(conversation, token.clone()).await?;
    if token.is_cancelled() {
        return Err(ApiError::Cancelled);
    }
    Ok(parse_snapshot(&body, &conversation.id, Utc::now()))
}

/// Empty first load: one resync, a short pause, exactly one retry
async fn fetch_first_load(
    api: &dyn MessageApi,
    conversation: &ConversationRef,
    token: &CancellationToken,
    retry_delay: Duration,
) -> Result<Vec<Message>, ApiError> {
    let messages = fetch_once(api, conversation, token).await?;
    if !messages.is_empty() {
        return Ok(messages);
    }

    info!(conversation = %conversation, "First load returned no messages, requesting resync");
    tokio::select! {
        biased;
        _ = token.cancelled() => return Err(ApiError::Cancelled),
        resynced = api.resync(conversation) => {
            if let Err(e) = resynced {
                warn!(conversation = %conversation, "Resync failed: {}", e);
            }
        }
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => return Err(ApiError::Cancelled),
        _ = tokio::time::sleep(retry_delay) => {}
    }

    fetch_once(api, conversation, token).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::models::{ConversationSource, SendTarget};

    /// Serves queued bodies in order, then repeats the last one
    struct QueueApi {
        bodies: Mutex<Vec<Value>>,
        lists: AtomicUsize,
        resyncs: AtomicUsize,
    }

    impl QueueApi {
        fn new(bodies: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                bodies: Mutex::new(bodies),
                lists: AtomicUsize::new(0),
                resyncs: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MessageApi for QueueApi {
        async fn list_messages(
            &self,
            _conversation: &ConversationRef,
            _token: CancellationToken,
        ) -> Result<Value, ApiError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.len() > 1 { Ok(bodies.remove(0)) } else { Ok(bodies[0].clone()) }
        }

        async fn send_message(&self, _target: &SendTarget, _text: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn resync(&self, _conversation: &ConversationRef) -> Result<(), ApiError> {
            self.resyncs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fetcher(api: Arc<QueueApi>) -> SnapshotFetcher {
        SnapshotFetcher::new(
            api,
            ConversationRef::new("c1", ConversationSource::GreenApi),
            CancellationToken::new(),
            Duration::from_millis(2000),
        )
    }

    fn one_message() -> Value {
        json!([{ "id": "m1", "body": "hi", "timestamp": 1_700_000_000, "fromMe": false }])
    }

    #[tokio::test]
    async fn test_single_flight() {
        let mut fetcher = fetcher(QueueApi::new(vec![one_message()]));
        let first = fetcher.try_start(false);
        assert!(first.is_some());
        assert!(fetcher.try_start(false).is_none());

        let outcome = first.unwrap().await;
        assert!(fetcher.finish(outcome.generation));
        assert!(fetcher.try_start(false).is_some());
    }

    #[tokio::test]
    async fn test_restart_supersedes_previous() {
        let mut fetcher = fetcher(QueueApi::new(vec![one_message()]));
        let stale = fetcher.try_start(false).unwrap();
        let fresh = fetcher.restart(false);

        let stale = stale.await;
        assert!(matches!(stale.result, Err(ApiError::Cancelled)));
        assert!(!fetcher.finish(stale.generation));

        let fresh = fresh.await;
        assert!(fetcher.finish(fresh.generation));
        assert_eq!(fresh.result.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_load_empty_retries_once() {
        let api = QueueApi::new(vec![json!([]), json!([])]);
        let mut fetcher = fetcher(Arc::clone(&api));

        let outcome = fetcher.restart(true).await;
        assert!(outcome.result.unwrap().is_empty());
        assert_eq!(api.resyncs.load(Ordering::SeqCst), 1);
        assert_eq!(api.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_load_retry_picks_up_data() {
        let api = QueueApi::new(vec![json!({ "messages": [] }), one_message()]);
        let mut fetcher = fetcher(Arc::clone(&api));

        let outcome = fetcher.restart(true).await;
        assert_eq!(outcome.result.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_later_empty_load_does_not_resync() {
        let api = QueueApi::new(vec![json!([])]);
        let mut fetcher = fetcher(Arc::clone(&api));

        let outcome = fetcher.restart(false).await;
        assert!(outcome.result.unwrap().is_empty());
        assert_eq!(api.resyncs.load(Ordering::SeqCst), 0);
        assert_eq!(api.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parent_cancel_aborts() {
        let api = QueueApi::new(vec![one_message()]);
        let parent = CancellationToken::new();
        let mut fetcher = SnapshotFetcher::new(
            api,
            ConversationRef::new("c1", ConversationSource::GreenApi),
            parent.clone(),
            Duration::from_millis(10),
        );

        let pending = fetcher.restart(false);
        parent.cancel();
        assert!(pending.await.result.unwrap_err().is_cancelled());
    }
}
