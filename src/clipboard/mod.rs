use anyhow::{Context, Result, bail};
use arboard::Clipboard;

use crate::models::Message;
use crate::utils::strip_ansi_codes;

/// Upper bound on copied text; message bodies are untrusted
const MAX_CLIPBOARD_SIZE: usize = 1024 * 1024;

/// Clipboard sink, swapped for a mock in tests
trait ClipboardProvider {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    fn new() -> Result<Self> {
        let clipboard = Clipboard::new().context("Failed to initialize clipboard")?;
        Ok(Self { clipboard })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.set_text(text).context("Failed to set clipboard contents")?;
        Ok(())
    }
}

/// What Ctrl+Y copies for a message: its text, or the attachment URL for a bare media message
pub fn clipboard_text(msg: &Message) -> Option<String> {
    let text = strip_ansi_codes(&msg.content);
    if !text.trim().is_empty() {
        return Some(text);
    }
    msg.media_url.as_deref().filter(|url| !url.is_empty()).map(strip_ansi_codes)
}

fn copy_with_provider(msg: &Message, provider: &mut dyn ClipboardProvider) -> Result<()> {
    let Some(text) = clipboard_text(msg) else {
        bail!("Message has no text to copy");
    };
    if text.len() > MAX_CLIPBOARD_SIZE {
        bail!("Message too large for clipboard ({} bytes, max {})", text.len(), MAX_CLIPBOARD_SIZE);
    }
    provider.set_text(&text)
}

/// Copy a message body to the system clipboard
///
/// # Errors
/// Fails when the message has neither text nor a media URL, when the body
/// exceeds 1MB, or when no system clipboard is available (headless sessions).
pub fn copy_message(msg: &Message) -> Result<()> {
    // Validate before touching the clipboard so headless runs report the real problem
    if clipboard_text(msg).is_none() {
        bail!("Message has no text to copy");
    }
    let mut clipboard = SystemClipboard::new()?;
    copy_with_provider(msg, &mut clipboard)
}
