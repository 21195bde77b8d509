use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

/// User actions from keyboard events
#[derive(Debug, PartialEq)]
pub enum Action {
    Quit,
    /// Clear the input line, dismiss a notice, or quit when there is nothing to clear
    Escape,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Submit,
    NextConversation,
    PrevConversation,
    Refresh,
    CopyToClipboard,
    Input(char),
    DeleteChar,
    Resize,
    None,
}

/// Poll for terminal events and convert to actions
pub fn poll_event(timeout: Duration) -> anyhow::Result<Action> {
    if event::poll(timeout)? {
        return Ok(match event::read()? {
            Event::Key(key) => key_to_action(key),
            Event::Resize(_, _) => Action::Resize,
            _ => Action::None,
        });
    }
    Ok(Action::None)
}

fn key_to_action(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Esc, _) => Action::Escape,

        (KeyCode::Up, _) => Action::ScrollUp,
        (KeyCode::Down, _) => Action::ScrollDown,
        (KeyCode::PageUp, _) => Action::PageUp,
        (KeyCode::PageDown, _) => Action::PageDown,

        (KeyCode::Enter, _) => Action::Submit,
        (KeyCode::Tab, _) => Action::NextConversation,
        (KeyCode::BackTab, _) => Action::PrevConversation,
        (KeyCode::Char('r'), KeyModifiers::CONTROL) => Action::Refresh,
        (KeyCode::Char('y'), KeyModifiers::CONTROL) => Action::CopyToClipboard,

        (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
            Action::Input(c)
        }
        (KeyCode::Backspace, _) => Action::DeleteChar,

        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Action {
        key_to_action(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_quit_and_escape() {
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(key(KeyCode::Esc, KeyModifiers::NONE), Action::Escape);
    }

    #[test]
    fn test_scrolling() {
        assert_eq!(key(KeyCode::Up, KeyModifiers::NONE), Action::ScrollUp);
        assert_eq!(key(KeyCode::Down, KeyModifiers::NONE), Action::ScrollDown);
        assert_eq!(key(KeyCode::PageUp, KeyModifiers::NONE), Action::PageUp);
        assert_eq!(key(KeyCode::PageDown, KeyModifiers::NONE), Action::PageDown);
    }

    #[test]
    fn test_conversation_switching() {
        assert_eq!(key(KeyCode::Tab, KeyModifiers::NONE), Action::NextConversation);
        assert_eq!(key(KeyCode::BackTab, KeyModifiers::SHIFT), Action::PrevConversation);
    }

    #[test]
    fn test_control_actions() {
        assert_eq!(key(KeyCode::Enter, KeyModifiers::NONE), Action::Submit);
        assert_eq!(key(KeyCode::Char('r'), KeyModifiers::CONTROL), Action::Refresh);
        assert_eq!(key(KeyCode::Char('y'), KeyModifiers::CONTROL), Action::CopyToClipboard);
    }

    #[test]
    fn test_typing() {
        assert_eq!(key(KeyCode::Char('q'), KeyModifiers::NONE), Action::Input('q'));
        assert_eq!(key(KeyCode::Char('H'), KeyModifiers::SHIFT), Action::Input('H'));
        assert_eq!(key(KeyCode::Backspace, KeyModifiers::NONE), Action::DeleteChar);
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(key(KeyCode::F(1), KeyModifiers::NONE), Action::None);
        assert_eq!(key(KeyCode::Char('x'), KeyModifiers::ALT), Action::None);
    }
}
