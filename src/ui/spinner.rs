//! Loading indicator: a small spinner + label rendered on the top border
//! of a given area.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Braille-dot spinner frames.  Cycles through these on each tick.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// "loading…" indicator shown while a page request is in flight.
pub struct LoadingIndicator {
    pub visible: bool,
    /// Monotonically increasing frame counter (drives the spinner frame).
    pub tick: u64,
}

impl Widget for LoadingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible || area.width < 16 || area.height == 0 {
            return;
        }

        let frame = SPINNER_FRAMES[(self.tick as usize) % SPINNER_FRAMES.len()];
        let label = format!(" {frame} loading ");

        let label_width = label.chars().count() as u16;
        // Top-right, inside the corner character.
        let x = area.x + area.width.saturating_sub(label_width + 2);
        let y = area.y;

        let line = Line::from(Span::styled(
            label,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

        buf.set_line(x, y, &line, label_width);
    }
}
