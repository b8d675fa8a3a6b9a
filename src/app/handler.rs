//! Input handling: maps key/mouse events to state mutations.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::config::Action;

use super::state::AppState;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent, now: Instant) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    // Ctrl+c always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };
    apply(state, action, now);
}

pub fn apply(state: &mut AppState, action: Action, now: Instant) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::ScrollUp => state.scroll_by(-state.scroll_step()),
        Action::ScrollDown => state.scroll_by(state.scroll_step()),
        Action::PageUp => state.scroll_by(-state.page_step()),
        Action::PageDown => state.scroll_by(state.page_step()),
        Action::Top => state.scroll_to(0.0),
        Action::Bottom => state.scroll_to(f64::INFINITY),
        Action::Reload => {
            tracing::info!("reload requested");
            state.reload(now);
        }
    }
}

/// Process a mouse event (wheel scrolling only).
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => state.scroll_by(state.scroll_step()),
        MouseEventKind::ScrollUp => state.scroll_by(-state.scroll_step()),
        _ => {}
    }
}
