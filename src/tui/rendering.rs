use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthChar;

use super::app::{MessageType, StatusMessage};
use super::layout::AppLayout;
use super::timestamps::format_message_time;
use crate::models::{ConversationRef, Direction, MediaType, Message};
use crate::utils::strip_ansi_codes;

const MUTED: Color = Color::Rgb(113, 113, 122);
const BRIGHT: Color = Color::Rgb(250, 250, 250);
const EMERALD: Color = Color::Rgb(16, 185, 129);
const SKY: Color = Color::Rgb(56, 189, 248);
const RED: Color = Color::Rgb(239, 68, 68);
const BAR_BG: Color = Color::Rgb(24, 24, 27);

/// Everything the renderer reads, borrowed from `App`
pub struct RenderState<'a> {
    pub conversations: &'a [ConversationRef],
    pub active: usize,
    pub lines: &'a [Line<'static>],
    pub scroll_offset: usize,
    pub anchored: bool,
    pub message_count: usize,
    pub input: &'a str,
    pub notice: Option<&'a str>,
    pub status_message: Option<&'a StatusMessage>,
}

/// Render the entire UI
pub fn render_ui(frame: &mut Frame, state: &RenderState) {
    let layout = AppLayout::new(frame.area());

    render_tabs(frame, layout.tabs_area, state.conversations, state.active);
    render_transcript(frame, layout.transcript_area, state.lines, state.scroll_offset);
    render_input(frame, layout.input_area, state.input, state.notice.is_some());
    render_status_bar(frame, layout.status_area, state);

    if let Some(notice) = state.notice {
        render_notice(frame, layout.transcript_area, notice);
    }
}

/// Lay out a transcript as terminal rows, wrapped to `width` columns
///
/// The row count is the content height the scroll preserver works with, so
/// wrapping happens here rather than in the `Paragraph` widget.
pub fn transcript_lines(
    messages: &[Message],
    width: usize,
    now: &DateTime<Utc>,
) -> Vec<Line<'static>> {
    let body_width = width.saturating_sub(2).max(1);
    let mut lines = Vec::with_capacity(messages.len() * 3);

    for (idx, msg) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        lines.push(header_line(msg, now));

        let content = strip_ansi_codes(&msg.content);
        if !content.trim().is_empty() {
            for row in wrap_text(&content, body_width) {
                lines.push(Line::from(format!("  {}", row)));
            }
        }
        if let Some(url) = msg.media_url.as_deref().filter(|url| !url.is_empty()) {
            let kind = match msg.media_type {
                Some(MediaType::Image) => "image",
                Some(MediaType::Video) => "video",
                _ => "media",
            };
            let text = format!("[{}] {}", kind, strip_ansi_codes(url));
            for row in wrap_text(&text, body_width) {
                let row = Span::styled(format!("  {}", row), Style::default().fg(MUTED));
                lines.push(Line::from(row));
            }
        }
    }

    lines
}

fn header_line(msg: &Message, now: &DateTime<Utc>) -> Line<'static> {
    let (who, color) = match msg.direction {
        Direction::Outbound => ("You", EMERALD),
        Direction::Inbound => ("Customer", SKY),
    };

    let time = format_message_time(&msg.timestamp, now);
    let mut spans = vec![
        Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" · {}", time), Style::default().fg(MUTED)),
    ];
    if msg.is_provisional() {
        let italic = Style::default().fg(MUTED).add_modifier(Modifier::ITALIC);
        spans.push(Span::styled(" · sending", italic));
    } else if let Some(status) = msg.status {
        spans.push(Span::styled(format!(" · {}", status.label()), Style::default().fg(MUTED)));
    }
    Line::from(spans)
}

/// Hard-wrap each line of `text` at `width` terminal columns
///
/// Wide characters (CJK, most emoji) count as two columns; a character wider
/// than the whole row gets a row of its own.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.lines() {
        let mut row = String::new();
        let mut used = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(c);
            used += w;
        }
        rows.push(row);
    }
    rows
}

fn render_tabs(frame: &mut Frame, area: Rect, conversations: &[ConversationRef], active: usize) {
    let mut spans = Vec::with_capacity(conversations.len() * 2);
    for (idx, conversation) in conversations.iter().enumerate() {
        let style = if idx == active {
            Style::default().fg(BRIGHT).bg(EMERALD).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(format!(" {} ", conversation), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_transcript(frame: &mut Frame, area: Rect, lines: &[Line<'static>], offset: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .title(" Transcript ");

    let paragraph = if lines.is_empty() {
        Paragraph::new("No messages yet").style(Style::default().fg(MUTED))
    } else {
        Paragraph::new(visible_window(lines, offset, block.inner(area).height as usize).to_vec())
    };

    frame.render_widget(paragraph.block(block), area);
}

/// The rows a pane of `height` shows when scrolled to `offset`
///
/// Slicing here instead of `Paragraph::scroll` keeps offsets past `u16::MAX` reachable.
fn visible_window<'a>(lines: &'a [Line<'static>], offset: usize, height: usize) -> &'a [Line<'static>] {
    let start = offset.min(lines.len());
    let end = start.saturating_add(height).min(lines.len());
    &lines[start..end]
}

fn render_input(frame: &mut Frame, area: Rect, input: &str, blocked: bool) {
    let border = if blocked { MUTED } else { EMERALD };
    let paragraph = Paragraph::new(input.to_string()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Message "),
    );
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &RenderState) {
    let (text, style) = if let Some(status) = state.status_message {
        let fg = match status.message_type {
            MessageType::Success => EMERALD,
            MessageType::Error => RED,
        };
        (format!(" {} ", status.text), Style::default().fg(fg).bg(BAR_BG))
    } else {
        let mut parts = vec![format!("{} messages", state.message_count)];
        parts.push(if state.anchored { "following".to_string() } else { "scrolled".to_string() });
        if state.conversations.len() > 1 {
            parts.push("Tab: switch".to_string());
        }
        parts.push("Enter: send".to_string());
        parts.push("Ctrl+Y: copy".to_string());
        parts.push("Ctrl+R: refresh".to_string());
        parts.push("Ctrl+C: quit".to_string());
        (format!(" {} ", parts.join(" | ")), Style::default().fg(BRIGHT).bg(BAR_BG))
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_notice(frame: &mut Frame, area: Rect, notice: &str) {
    let [row] = Layout::vertical([Constraint::Length(5)]).flex(Flex::Center).areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(70)]).flex(Flex::Center).areas(row);

    let paragraph = Paragraph::new(vec![
        Line::from(strip_ansi_codes(notice)),
        Line::from(Span::styled("Enter or Esc to dismiss", Style::default().fg(MUTED))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(RED))
            .title(" Send failed "),
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}
