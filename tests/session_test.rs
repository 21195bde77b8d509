//! Session behavior against a scripted backend, on a paused clock

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{RecordBuilder, Reply, ScriptedApi, base_time, listing};
use inbox_transcript::config::AppConfig;
use inbox_transcript::models::{ConversationRef, ConversationSource, Message};
use inbox_transcript::sync::{InboxSession, SessionCommand, SessionEvent, SessionHandle};
use tokio::task::JoinHandle;

fn conversation(id: &str) -> ConversationRef {
    ConversationRef::new(id, ConversationSource::GreenApi)
}

fn start(api: &Arc<ScriptedApi>) -> (SessionHandle, JoinHandle<()>) {
    let (session, handle) = InboxSession::new(api.clone(), &AppConfig::default());
    (handle, tokio::spawn(session.run()))
}

async fn next_event(handle: &mut SessionHandle) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(60), handle.events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("session closed")
}

async fn next_transcript(handle: &mut SessionHandle) -> (String, Vec<Message>, bool) {
    match next_event(handle).await {
        SessionEvent::Transcript { conversation_id, messages, force_scroll } => {
            (conversation_id, messages, force_scroll)
        }
        other => panic!("expected a transcript, got {:?}", other),
    }
}

fn ids(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.id.as_str()).collect()
}

async fn shutdown(handle: SessionHandle, task: JoinHandle<()>) {
    handle.commands.send(SessionCommand::Shutdown).unwrap();
    task.await.unwrap();
}

fn one_message() -> Reply {
    Reply::Body(listing(vec![RecordBuilder::new("m1").body("hola").at(base_time())]))
}

#[tokio::test(start_paused = true)]
async fn test_empty_first_load_resyncs_once_then_retries_once() {
    let api = Arc::new(ScriptedApi::new(vec![Reply::Body(serde_json::json!([]))]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    let (_, cached, force) = next_transcript(&mut handle).await;
    assert!(cached.is_empty());
    assert!(force);

    let (_, loaded, force) = next_transcript(&mut handle).await;
    assert!(loaded.is_empty());
    assert!(!force);
    assert_eq!(api.resync_count(), 1);
    assert_eq!(api.list_count(), 2);

    // Later empty polls neither resync nor re-emit
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(api.resync_count(), 1);
    assert!(api.list_count() >= 4);
    assert!(handle.events.try_recv().is_err());

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_first_load_retry_picks_up_resynced_messages() {
    let api = Arc::new(ScriptedApi::new(vec![Reply::Body(serde_json::json!([])), one_message()]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;

    let (_, messages, _) = next_transcript(&mut handle).await;
    assert_eq!(ids(&messages), vec!["m1"]);
    assert_eq!(api.resync_count(), 1);

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_transient_empty_poll_keeps_transcript() {
    let api = Arc::new(ScriptedApi::new(vec![one_message(), Reply::Body(serde_json::json!([]))]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    let (_, messages, _) = next_transcript(&mut handle).await;
    assert_eq!(ids(&messages), vec!["m1"]);

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(api.list_count() >= 3);
    assert_eq!(api.resync_count(), 0);
    assert!(handle.events.try_recv().is_err());

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_reports_and_keeps_transcript() {
    let api = Arc::new(ScriptedApi::new(vec![one_message(), Reply::Fail(500), one_message()]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    next_transcript(&mut handle).await;

    match next_event(&mut handle).await {
        SessionEvent::FetchFailed { conversation_id, error } => {
            assert_eq!(conversation_id, "c1");
            assert!(error.contains("500"));
        }
        other => panic!("expected a fetch failure, got {:?}", other),
    }

    // Recovery with the same data is not a change
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(handle.events.try_recv().is_err());

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_send_shows_echo_then_folds_confirmed_copy() {
    let api = Arc::new(ScriptedApi::new(vec![one_message()]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    next_transcript(&mut handle).await;

    handle.commands.send(SessionCommand::Send("ping".to_string())).unwrap();
    let (_, echoed, force) = next_transcript(&mut handle).await;
    assert!(force);
    assert_eq!(echoed.len(), 2);
    assert!(echoed[1].is_provisional());
    assert_eq!(echoed[1].content, "ping");

    api.script(vec![Reply::Body(listing(vec![
        RecordBuilder::new("m1").body("hola").at(base_time()),
        RecordBuilder::new("wamid.9").body("ping").at(Utc::now()).outbound().status("sent"),
    ]))]);

    let (_, confirmed, force) = next_transcript(&mut handle).await;
    assert!(!force);
    assert_eq!(ids(&confirmed), vec!["m1", "wamid.9"]);
    assert!(confirmed.iter().all(|m| !m.is_provisional()));

    let sent = api.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "ping");

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_keeps_echo_visible() {
    let api = Arc::new(ScriptedApi::new(vec![one_message()]));
    api.fail_sends(500);
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    next_transcript(&mut handle).await;

    handle.commands.send(SessionCommand::Send("ping".to_string())).unwrap();
    let (_, echoed, _) = next_transcript(&mut handle).await;
    assert!(echoed.iter().any(Message::is_provisional));

    match next_event(&mut handle).await {
        SessionEvent::SendFailed { conversation_id, error } => {
            assert_eq!(conversation_id, "c1");
            assert!(error.contains("500"));
        }
        other => panic!("expected a send failure, got {:?}", other),
    }

    // Polls that do not carry the message leave the echo where it is
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(handle.events.try_recv().is_err());

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_blank_send_is_rejected() {
    let api = Arc::new(ScriptedApi::new(vec![one_message()]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    next_transcript(&mut handle).await;

    handle.commands.send(SessionCommand::Send("   ".to_string())).unwrap();
    assert!(matches!(next_event(&mut handle).await, SessionEvent::SendRejected { .. }));
    assert!(api.sent().is_empty());

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_switching_back_shows_cached_view_first() {
    let api = Arc::new(ScriptedApi::new(vec![one_message()]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    next_transcript(&mut handle).await;

    handle.commands.send(SessionCommand::Select(conversation("c2"))).unwrap();
    let (id, cached, _) = next_transcript(&mut handle).await;
    assert_eq!(id, "c2");
    assert!(cached.is_empty());
    let (id, _, _) = next_transcript(&mut handle).await;
    assert_eq!(id, "c2");

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    let (id, cached, force) = next_transcript(&mut handle).await;
    assert_eq!(id, "c1");
    assert_eq!(ids(&cached), vec!["m1"]);
    assert!(force);

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_leave_drops_cached_transcript() {
    let api = Arc::new(ScriptedApi::new(vec![one_message()]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    next_transcript(&mut handle).await;
    next_transcript(&mut handle).await;

    handle.commands.send(SessionCommand::Leave).unwrap();
    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    let (_, cached, _) = next_transcript(&mut handle).await;
    assert!(cached.is_empty());

    shutdown(handle, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_aborts_pending_fetch_without_touching_cache() {
    let api = Arc::new(ScriptedApi::new(vec![Reply::Hang]));
    let (mut handle, task) = start(&api);

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    let (id, _, _) = next_transcript(&mut handle).await;
    assert_eq!(id, "c1");

    // Let the first fetch start and block
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.list_count(), 1);

    api.script(vec![one_message()]);
    handle.commands.send(SessionCommand::Select(conversation("c2"))).unwrap();

    let (id, cached, _) = next_transcript(&mut handle).await;
    assert_eq!(id, "c2");
    assert!(cached.is_empty());
    let (id, messages, _) = next_transcript(&mut handle).await;
    assert_eq!(id, "c2");
    assert_eq!(ids(&messages), vec!["m1"]);

    // Later polls of c2 are unchanged and the aborted c1 fetch never reports
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(handle.events.try_recv().is_err());

    handle.commands.send(SessionCommand::Select(conversation("c1"))).unwrap();
    let (id, cached, force) = next_transcript(&mut handle).await;
    assert_eq!(id, "c1");
    assert!(cached.is_empty());
    assert!(force);

    shutdown(handle, task).await;
}
