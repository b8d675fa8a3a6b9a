//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};

/// Feed pane (bordered) above a one-line status bar.
pub struct AppLayout {
    pub feed_area: Rect,
    /// Inside the feed border: the scroll container handed to the engine.
    pub feed_inner: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // feed pane
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            feed_area: chunks[0],
            feed_inner: Block::default().borders(Borders::ALL).inner(chunks[0]),
            status_area: chunks[1],
        }
    }
}
