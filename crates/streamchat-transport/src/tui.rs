//! TUI input bridge for terminal hosts.
//!
//! Maps crossterm events onto the page's entry points, the way a browser maps
//! keystrokes and clicks onto inline handlers.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use streamchat_core::Key;

/// What a terminal event asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiInput {
    /// Forward a key to the page's key handler.
    Key(Key),
    /// Move the source-bubble selection forward.
    SelectNextSource,
    /// Move the source-bubble selection back.
    SelectPreviousSource,
    /// Click the selected source bubble.
    ToggleSelectedSource,
    /// Scroll the transcript by this many lines (negative is up).
    Scroll(i16),
    /// The terminal was resized.
    Resize { cols: u16, rows: u16 },
    /// Leave the host.
    Quit,
}

/// Translates crossterm events for a chat page.
pub struct TuiBridge;

impl TuiBridge {
    /// Convert a crossterm key event.
    #[must_use]
    pub fn key_to_input(key: &KeyEvent) -> Option<TuiInput> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c' | 'd') => Some(TuiInput::Quit),
                KeyCode::Char('o') => Some(TuiInput::ToggleSelectedSource),
                _ => None,
            };
        }

        let input = match key.code {
            KeyCode::Enter => TuiInput::Key(Key::Enter),
            KeyCode::Backspace => TuiInput::Key(Key::Backspace),
            KeyCode::Char(c) => TuiInput::Key(Key::Char(c)),
            KeyCode::Tab => TuiInput::SelectNextSource,
            KeyCode::BackTab => TuiInput::SelectPreviousSource,
            KeyCode::Up => TuiInput::Scroll(-1),
            KeyCode::Down => TuiInput::Scroll(1),
            KeyCode::PageUp => TuiInput::Scroll(-10),
            KeyCode::PageDown => TuiInput::Scroll(10),
            _ => TuiInput::Key(Key::Other),
        };
        Some(input)
    }

    /// Convert any crossterm event.
    #[must_use]
    pub fn handle_event(event: &Event) -> Option<TuiInput> {
        match event {
            Event::Key(key) => Self::key_to_input(key),
            Event::Resize(cols, rows) => Some(TuiInput::Resize {
                cols: *cols,
                rows: *rows,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_typing_keys() {
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::Char('a'), KeyModifiers::NONE)),
            Some(TuiInput::Key(Key::Char('a')))
        );
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(TuiInput::Key(Key::Char('A')))
        );
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(TuiInput::Key(Key::Enter))
        );
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::F(5), KeyModifiers::NONE)),
            Some(TuiInput::Key(Key::Other))
        );
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(TuiInput::Quit)
        );
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::Char('o'), KeyModifiers::CONTROL)),
            Some(TuiInput::ToggleSelectedSource)
        );
        assert_eq!(
            TuiBridge::key_to_input(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn test_release_ignored() {
        let mut release = key(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(TuiBridge::key_to_input(&release), None);
    }

    #[test]
    fn test_resize_event() {
        assert_eq!(
            TuiBridge::handle_event(&Event::Resize(120, 40)),
            Some(TuiInput::Resize { cols: 120, rows: 40 })
        );
        assert_eq!(TuiBridge::handle_event(&Event::FocusGained), None);
    }
}
