//! Keyboard input dispatch: global keys, then panel-specific ones.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Panel};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.running = false,
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            if let Some(panel) = Panel::from_index(index) {
                app.set_panel(panel);
            }
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.set_panel(app.active_panel.prev());
            } else {
                app.set_panel(app.active_panel.next());
            }
        }
        KeyCode::BackTab => app.set_panel(app.active_panel.prev()),
        KeyCode::Char(']') => app.next_investor(),
        KeyCode::Char('[') => app.prev_investor(),
        KeyCode::Char('-') => app.shift_start(-1),
        KeyCode::Char('+') | KeyCode::Char('=') => app.shift_start(1),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => app.cursor = app.row_count().saturating_sub(1),
        _ => {}
    }
}
