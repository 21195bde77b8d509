//! Interactive transcript viewer for `watch`
mod app;
mod events;
mod layout;
mod rendering;
mod terminal;
mod timestamps;

use anyhow::Result;
pub use app::App;
use terminal::TerminalGuard;

use crate::config::TuiConfig;
use crate::models::ConversationRef;
use crate::sync::SessionHandle;

/// Run the viewer until the operator quits; blocks the calling thread
pub fn run_interactive(
    conversations: Vec<ConversationRef>,
    handle: SessionHandle,
    config: &TuiConfig,
) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let mut app = App::new(conversations, handle, config.anchor_threshold_rows as usize);

    let res = app.run(guard.terminal_mut());

    guard.restore()?;
    res
}
