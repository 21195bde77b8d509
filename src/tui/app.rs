//! Transcript viewer state and event handling.
//!
//! The `App` never touches the network. It forwards operator intent to the
//! session as [`SessionCommand`]s and applies [`SessionEvent`]s as they arrive:
//!
//! - **Transcript updates**: laid out into rows, then the scroll preserver decides
//!   whether to follow the bottom or keep the reader's place
//! - **Send failures**: a blocking notice that swallows input until dismissed
//! - **Rejections and fetch failures**: transient status-bar messages
//! - **Dirty state tracking**: redraw only when something changed

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::text::Line;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;

use super::events::{Action, poll_event};
use super::layout::AppLayout;
use super::rendering::{RenderState, render_ui, transcript_lines};
use crate::clipboard::copy_message;
use crate::engine::{ScrollMetrics, ScrollPreserver};
use crate::models::{ConversationRef, Message};
use crate::sync::{SessionCommand, SessionEvent, SessionHandle};

/// Duration for success status messages (milliseconds)
const STATUS_SUCCESS_DURATION_MS: u64 = 3000;
/// Duration for error status messages (milliseconds)
const STATUS_ERROR_DURATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Success,
    Error,
}

/// Transient status message with expiry
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub message_type: MessageType,
    pub expires_at: Instant,
}

pub struct App {
    conversations: Vec<ConversationRef>,
    active: usize,
    transcript: Vec<Message>,
    lines: Vec<Line<'static>>,
    input: String,
    scroll: ScrollPreserver,
    offset: usize,
    viewport_width: usize,
    viewport_height: usize,
    /// Blocking send-failure notice
    notice: Option<String>,
    status_message: Option<StatusMessage>,
    handle: SessionHandle,
    should_quit: bool,
    needs_redraw: bool,
    last_draw_time: Instant,
}

impl App {
    /// Create the viewer and select the first conversation
    pub fn new(
        conversations: Vec<ConversationRef>,
        handle: SessionHandle,
        anchor_threshold_rows: usize,
    ) -> Self {
        let mut app = Self {
            conversations,
            active: 0,
            transcript: Vec::new(),
            lines: Vec::new(),
            input: String::new(),
            scroll: ScrollPreserver::new(anchor_threshold_rows),
            offset: 0,
            viewport_width: 80,
            viewport_height: 20,
            notice: None,
            status_message: None,
            handle,
            should_quit: false,
            needs_redraw: true,
            last_draw_time: Instant::now(),
        };
        if let Some(first) = app.conversations.first().cloned() {
            app.send_command(SessionCommand::Select(first));
        }
        app
    }

    fn set_status(&mut self, text: impl Into<String>, message_type: MessageType, duration_ms: u64) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            message_type,
            expires_at: Instant::now() + Duration::from_millis(duration_ms),
        });
        self.needs_redraw = true;
    }

    fn check_and_clear_expired_status(&mut self) {
        let expired =
            self.status_message.as_ref().is_some_and(|msg| Instant::now() >= msg.expires_at);
        if expired {
            self.status_message = None;
            self.needs_redraw = true;
        }
    }

    fn send_command(&mut self, command: SessionCommand) {
        if self.handle.commands.send(command).is_err() {
            debug!("Session is gone, quitting viewer");
            self.should_quit = true;
        }
    }

    fn active_conversation(&self) -> Option<&ConversationRef> {
        self.conversations.get(self.active)
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.offset,
            viewport_height: self.viewport_height,
            content_height: self.lines.len(),
        }
    }

    /// Track the transcript pane size; re-wraps rows when the width changes
    fn set_viewport(&mut self, width: usize, height: usize) {
        if (width, height) == (self.viewport_width, self.viewport_height) {
            return;
        }
        let plan = self.scroll.before_update(self.metrics(), false);
        let rewrap = width != self.viewport_width;
        self.viewport_width = width;
        self.viewport_height = height;
        if rewrap {
            self.lines = transcript_lines(&self.transcript, width, &Utc::now());
        }
        self.offset = self.scroll.after_update(plan, height, self.lines.len());
        self.needs_redraw = true;
    }

    fn drain_events(&mut self) {
        loop {
            match self.handle.events.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.should_quit = true;
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Transcript { conversation_id, messages, force_scroll } => {
                let active = self.active_conversation().map(|c| c.id.as_str());
                if active != Some(conversation_id.as_str()) {
                    return;
                }
                let plan = self.scroll.before_update(self.metrics(), force_scroll);
                self.transcript = messages;
                self.lines = transcript_lines(&self.transcript, self.viewport_width, &Utc::now());
                self.offset =
                    self.scroll.after_update(plan, self.viewport_height, self.lines.len());
                self.needs_redraw = true;
            }
            SessionEvent::SendFailed { error, .. } => {
                self.notice = Some(format!("Message was not delivered: {}", error));
                self.needs_redraw = true;
            }
            SessionEvent::FetchFailed { error, .. } => {
                let text = format!("Refresh failed: {}", error);
                self.set_status(text, MessageType::Error, STATUS_ERROR_DURATION_MS);
            }
            SessionEvent::SendRejected { reason } => {
                let text = format!("Not sent: {}", reason);
                self.set_status(text, MessageType::Error, STATUS_ERROR_DURATION_MS);
            }
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            self.check_and_clear_expired_status();
            self.drain_events();

            let size = terminal.size()?;
            let layout = AppLayout::new(Rect::new(0, 0, size.width, size.height));
            let (width, height) = layout.transcript_inner();
            self.set_viewport(width, height);

            // Draw if dirty or if it's been >100ms (for terminal resize handling)
            let now = Instant::now();
            let stale = now.duration_since(self.last_draw_time) >= Duration::from_millis(100);
            if self.needs_redraw || stale {
                terminal.draw(|f| {
                    let state = RenderState {
                        conversations: &self.conversations,
                        active: self.active,
                        lines: &self.lines,
                        scroll_offset: self.offset,
                        anchored: self.scroll.is_anchored(),
                        message_count: self.transcript.len(),
                        input: &self.input,
                        notice: self.notice.as_deref(),
                        status_message: self.status_message.as_ref(),
                    };
                    render_ui(f, &state);
                })?;
                self.needs_redraw = false;
                self.last_draw_time = now;
            }

            let action = poll_event(Duration::from_millis(100))?;
            self.handle_action(action);
        }

        let _ = self.handle.commands.send(SessionCommand::Shutdown);
        Ok(())
    }

    fn handle_action(&mut self, action: Action) {
        if action != Action::None {
            self.needs_redraw = true;
        }

        if self.notice.is_some() {
            match action {
                Action::Quit => self.should_quit = true,
                Action::Submit | Action::Escape => self.notice = None,
                _ => {}
            }
            return;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Escape => {
                if self.input.is_empty() {
                    self.should_quit = true;
                } else {
                    self.input.clear();
                }
            }
            Action::ScrollUp => self.scroll_by(-1),
            Action::ScrollDown => self.scroll_by(1),
            Action::PageUp => self.scroll_by(-(self.viewport_height.max(1) as isize)),
            Action::PageDown => self.scroll_by(self.viewport_height.max(1) as isize),
            Action::Submit => self.submit(),
            Action::NextConversation => self.switch_conversation(1),
            Action::PrevConversation => self.switch_conversation(-1),
            Action::Refresh => {
                self.send_command(SessionCommand::Refresh);
                self.set_status("Refreshing...", MessageType::Success, STATUS_SUCCESS_DURATION_MS);
            }
            Action::CopyToClipboard => self.copy_latest(),
            Action::Input(c) => self.input.push(c),
            Action::DeleteChar => {
                self.input.pop();
            }
            Action::Resize | Action::None => {}
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.metrics().max_offset();
        self.offset = self.offset.saturating_add_signed(delta).min(max);
        self.scroll.on_user_scroll(self.metrics());
    }

    fn submit(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        self.send_command(SessionCommand::Send(text));
    }

    fn switch_conversation(&mut self, delta: isize) {
        let count = self.conversations.len();
        if count < 2 {
            return;
        }
        self.active = (self.active as isize + delta).rem_euclid(count as isize) as usize;
        self.transcript.clear();
        self.lines.clear();
        self.offset = 0;
        self.scroll.reset();

        if let Some(conversation) = self.active_conversation().cloned() {
            self.send_command(SessionCommand::Select(conversation));
        }
    }

    fn copy_latest(&mut self) {
        let Some(latest) = self.transcript.last() else {
            self.set_status("Nothing to copy", MessageType::Error, STATUS_ERROR_DURATION_MS);
            return;
        };
        match copy_message(latest) {
            Ok(()) => self.set_status(
                "✓ Copied to clipboard",
                MessageType::Success,
                STATUS_SUCCESS_DURATION_MS,
            ),
            Err(e) => {
                self.set_status(format!("✗ {}", e), MessageType::Error, STATUS_ERROR_DURATION_MS)
            }
        }
    }
}
