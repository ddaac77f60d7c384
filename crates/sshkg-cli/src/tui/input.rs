//! Key press → controller event mapping.

use super::controller::{Event, Lifecycle};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Translate a key press for the current lifecycle state.
///
/// Returns `None` for keys the state does not bind. Release and repeat
/// events are dropped so each press is seen once.
pub fn map_key(lifecycle: Lifecycle, key: KeyEvent) -> Option<Event> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if is_interrupt(&key) {
        return Some(match lifecycle {
            Lifecycle::Confirm => Event::Deny,
            Lifecycle::AlgorithmSelection => Event::Quit,
            _ => Event::AnyKey,
        });
    }

    match lifecycle {
        Lifecycle::AlgorithmSelection => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Event::CursorUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Event::CursorDown),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Event::Select),
            KeyCode::Char('q' | 'Q') => Some(Event::Quit),
            _ => None,
        },
        Lifecycle::Confirm => match key.code {
            KeyCode::Char('y' | 'Y') => Some(Event::Affirm),
            KeyCode::Char('n' | 'N' | 'q' | 'Q') => Some(Event::Deny),
            _ => None,
        },
        // No cancellation while stages run; the controller ignores these.
        Lifecycle::Generating | Lifecycle::ProgressComplete => Some(Event::AnyKey),
        Lifecycle::Complete | Lifecycle::Error => Some(Event::AnyKey),
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}
