//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme: change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── cards ──────────────────────────────────────────────────
    pub fn card_border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn card_title_style() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn card_aux_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    /// Fallback image fill when an item has no placeholder colour.
    pub fn image_fill(seed: u64) -> Color {
        const PALETTE: [Color; 6] = [
            Color::Rgb(94, 129, 172),
            Color::Rgb(163, 190, 140),
            Color::Rgb(208, 135, 112),
            Color::Rgb(180, 142, 173),
            Color::Rgb(235, 203, 139),
            Color::Rgb(136, 192, 208),
        ];
        PALETTE[(seed % PALETTE.len() as u64) as usize]
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn error_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::LightRed)
            .add_modifier(Modifier::BOLD)
    }
}
