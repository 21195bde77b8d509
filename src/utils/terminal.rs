//! Terminal output sanitization utilities
//!
//! # Security: Terminal Injection Prevention
//!
//! Message bodies come from customers over WhatsApp and must be treated as hostile
//! before they reach a terminal. Embedded escape sequences could clear the screen,
//! move the cursor, retitle the window, or restyle the viewer. Both the `snapshot`
//! printer and the interactive viewer pass message text through [`strip_ansi_codes`].

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Strips ANSI escape sequences and stray control characters
///
/// Handles CSI (`ESC [ ... letter`) and OSC (`ESC ] ... BEL` or `ESC ] ... ESC \`)
/// sequences; any other escape consumes only the following character. Tab,
/// newline and carriage return survive.
///
/// # Examples
///
/// ```
/// use inbox_transcript::utils::terminal::strip_ansi_codes;
///
/// let text = "\x1b[31mRed text\x1b[0m";
/// assert_eq!(strip_ansi_codes(text), "Red text");
/// ```
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ESC {
            match chars.next() {
                Some('[') => {
                    // CSI ends at the first ASCII letter
                    for next in chars.by_ref() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
                Some(']') => {
                    while let Some(next) = chars.next() {
                        if next == BEL {
                            break;
                        }
                        if next == ESC && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        if ch.is_control() && !matches!(ch, '\t' | '\n' | '\r') {
            continue;
        }

        result.push(ch);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_color_codes() {
        let text = "\x1b[31mRed text\x1b[0m normal";
        assert_eq!(strip_ansi_codes(text), "Red text normal");
    }

    #[test]
    fn test_strip_cursor_movement() {
        let text = "hola\x1b[2K\x1b[1A necesito ayuda";
        assert_eq!(strip_ansi_codes(text), "hola necesito ayuda");
    }

    #[test]
    fn test_strip_osc_window_title() {
        let text = "\x1b]0;pwned\x07Order #1042 shipped";
        assert_eq!(strip_ansi_codes(text), "Order #1042 shipped");

        let text = "\x1b]2;pwned\x1b\\ok";
        assert_eq!(strip_ansi_codes(text), "ok");
    }

    #[test]
    fn test_strip_bell_and_backspace() {
        assert_eq!(strip_ansi_codes("Alert! \x07"), "Alert! ");
        assert_eq!(strip_ansi_codes("Test\x08"), "Test");
    }

    #[test]
    fn test_preserves_whitespace_controls() {
        let text = "Line 1\nLine 2\rLine 3\tTabbed";
        assert_eq!(strip_ansi_codes(text), text);
    }

    #[test]
    fn test_unicode_survives() {
        let text = "Gracias 👋 \x1b[1m¡listo!\x1b[0m 🌍";
        assert_eq!(strip_ansi_codes(text), "Gracias 👋 ¡listo! 🌍");
    }

    #[test]
    fn test_trailing_escape() {
        assert_eq!(strip_ansi_codes("abc\x1b"), "abc");
        assert_eq!(strip_ansi_codes(""), "");
    }
}
