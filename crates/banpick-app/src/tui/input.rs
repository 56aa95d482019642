// Keyboard input handling.
//
// Printable keys edit the command prompt; Enter parses the line into a
// `UserCommand`. A few shortcuts act without typing a command.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::command::{parse_command, HELP};
use crate::protocol::UserCommand;

/// Rows moved by PageUp/PageDown in the entity browser.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator, `None` when it only changed local state.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports both press and release.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return match key_event.code {
            KeyCode::Char('c') => Some(UserCommand::Quit),
            KeyCode::Char('z') => Some(UserCommand::Undo),
            KeyCode::Char('u') => {
                view_state.input.clear();
                None
            }
            _ => None,
        };
    }

    match key_event.code {
        KeyCode::Enter => submit(view_state),
        KeyCode::Tab => {
            if view_state.input.is_empty() {
                Some(UserCommand::AcceptSuggestion)
            } else {
                None
            }
        }
        KeyCode::Backspace => {
            view_state.input.pop();
            None
        }
        KeyCode::Esc => {
            view_state.input.clear();
            view_state.notice = None;
            None
        }
        KeyCode::Up => {
            scroll_up(view_state, 1);
            None
        }
        KeyCode::Down => {
            scroll_down(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll_up(view_state, PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            scroll_down(view_state, PAGE_SIZE);
            None
        }
        KeyCode::Char(c) => {
            view_state.input.push(c);
            None
        }
        _ => None,
    }
}

/// Parse and clear the prompt line.
fn submit(view_state: &mut ViewState) -> Option<UserCommand> {
    let line = std::mem::take(&mut view_state.input);
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "?" || trimmed.eq_ignore_ascii_case("help") {
        view_state.notice = Some(HELP.to_string());
        return None;
    }
    match parse_command(trimmed) {
        Ok(cmd) => {
            view_state.notice = None;
            Some(cmd)
        }
        Err(e) => {
            view_state.notice = Some(e.to_string());
            // Keep the line so it can be corrected.
            view_state.input = line;
            None
        }
    }
}

fn scroll_up(view_state: &mut ViewState, rows: usize) {
    view_state.browser_scroll = view_state.browser_scroll.saturating_sub(rows);
}

fn scroll_down(view_state: &mut ViewState, rows: usize) {
    let max = view_state.browser_len().saturating_sub(1);
    view_state.browser_scroll = (view_state.browser_scroll + rows).min(max);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
