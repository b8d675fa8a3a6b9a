//! Feed widget: draws the materialized cards at their engine positions.
//!
//! ## Architecture
//!
//! * **Card content** (`CardLayout`): pure; wraps the title and sizes the
//!   image for a column width.  The same value is rendered and used to
//!   report the card's natural height, so measurement and drawing agree.
//! * **Geometry** (`card_rect`): layout pixels to terminal cells with
//!   vertical clipping against the scroll container.
//! * **Widget** (`FeedWidget`): draws the cards in the visible range plus
//!   the spinner.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use waterfall::core::estimate::image_height;
use waterfall::core::feed::Feed;
use waterfall::core::item::{Item, ItemId, Position};

use crate::app::host::{CELL_HEIGHT, CELL_WIDTH};
use crate::ui::spinner::LoadingIndicator;
use crate::ui::theme::Theme;

const IMAGE_GLYPH: &str = "▒";

/// Cap on image rows per card; extreme aspect ratios are cropped here.
const MAX_IMAGE_ROWS: u16 = 512;

// ─── card content ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub image_rows: u16,
    pub title: Vec<String>,
    pub aux: Option<String>,
}

impl CardLayout {
    pub fn new(item: &Item, column_width: f64) -> Self {
        let cells = (column_width / CELL_WIDTH).floor().max(0.0) as usize;
        let inner = cells.saturating_sub(2).max(1);
        let image_rows = (image_height(item, column_width) / CELL_HEIGHT)
            .round()
            .max(1.0)
            .min(f64::from(MAX_IMAGE_ROWS)) as u16;

        let aux = match (item.extra("author"), item.extra("likes")) {
            (None, None) => None,
            (author, likes) => {
                let mut s = String::new();
                if let Some(a) = author {
                    s.push('@');
                    s.push_str(a);
                }
                if let Some(l) = likes {
                    if !s.is_empty() {
                        s.push_str("  ");
                    }
                    s.push_str("♥ ");
                    s.push_str(l);
                }
                Some(s)
            }
        };

        Self {
            image_rows,
            title: wrap_words(&item.text, inner),
            aux,
        }
    }

    /// Rows inside the border.
    pub fn content_rows(&self) -> u16 {
        let title_rows = u16::try_from(self.title.len()).unwrap_or(u16::MAX);
        self.image_rows
            .saturating_add(title_rows)
            .saturating_add(u16::from(self.aux.is_some()))
    }

    /// Height of the bordered card in layout pixels.
    pub fn natural_height(&self) -> f64 {
        f64::from(self.content_rows().saturating_add(2)) * CELL_HEIGHT
    }

    fn lines(&self, width: u16, fill: Color) -> Vec<Line<'static>> {
        let image_row = IMAGE_GLYPH.repeat(width as usize);
        let mut lines: Vec<Line> = (0..self.image_rows)
            .map(|_| Line::from(Span::styled(image_row.clone(), Style::default().fg(fill))))
            .collect();
        lines.extend(
            self.title
                .iter()
                .map(|t| Line::from(Span::styled(t.clone(), Theme::card_title_style()))),
        );
        if let Some(aux) = &self.aux {
            lines.push(Line::from(Span::styled(aux.clone(), Theme::card_aux_style())));
        }
        lines
    }
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Natural heights of every materialized, placed card.
pub fn natural_heights(feed: &Feed) -> Vec<(usize, f64)> {
    let column_width = feed.column_plan().column_width;
    feed.visible_items()
        .filter(|(_, _, position)| position.is_some())
        .map(|(index, item, _)| (index, CardLayout::new(item, column_width).natural_height()))
        .collect()
}

// ─── geometry ───────────────────────────────────────────────────

/// On-screen placement of one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRect {
    pub rect: Rect,
    pub top_clipped: bool,
    pub bot_clipped: bool,
    /// Content rows hidden above the viewport.
    pub content_skip: u16,
}

/// Map a pixel position to cells inside `inner`, or `None` when the card is
/// off screen or too small to draw.
pub fn card_rect(position: &Position, scroll_top: f64, x_offset: f64, inner: Rect) -> Option<CardRect> {
    let col = ((position.left + x_offset) / CELL_WIDTH).round() as i32;
    let width = (position.width / CELL_WIDTH).round() as i32;
    let rows_down = ((position.top - scroll_top) / CELL_HEIGHT).round() as i32;
    let abs_y = (inner.y as i32).saturating_add(rows_down);
    let abs_bottom = abs_y.saturating_add((position.height / CELL_HEIGHT).round() as i32);
    let area_top = inner.y as i32;
    let area_bottom = (inner.y + inner.height) as i32;

    if abs_bottom <= area_top || abs_y >= area_bottom {
        return None;
    }

    let x = (inner.x as i32).saturating_add(col);
    let right = x.saturating_add(width).min((inner.x + inner.width) as i32);
    if x >= right {
        return None;
    }

    let vis_y = abs_y.max(area_top);
    let vis_h = abs_bottom.min(area_bottom) - vis_y;
    if vis_h < 2 {
        return None;
    }
    let top_clipped = abs_y < area_top;
    Some(CardRect {
        rect: Rect::new(x as u16, vis_y as u16, (right - x) as u16, vis_h as u16),
        top_clipped,
        bot_clipped: abs_bottom > area_bottom,
        content_skip: if top_clipped { (area_top - abs_y) as u16 } else { 0 },
    })
}

// ─── widget ─────────────────────────────────────────────────────

pub struct FeedWidget<'a> {
    pub feed: &'a Feed,
    pub block: Block<'a>,
    /// Displayed (animated) scroll offset in layout pixels.
    pub scroll_top: f64,
    pub tick: u64,
}

impl<'a> Widget for FeedWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = self.block.inner(area);
        self.block.render(area, buf);
        LoadingIndicator {
            visible: self.feed.is_loading(),
            tick: self.tick,
        }
        .render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.feed.item_count() == 0 {
            let message = if self.feed.has_more() { "Loading…" } else { "Nothing here." };
            Paragraph::new(Line::from(Span::styled(message, Theme::card_aux_style())))
                .render(Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(1), 1), buf);
            return;
        }

        // While the container is wider than the committed columns (and the
        // wider plan is still debouncing), keep the block centered.
        let x_offset = if self.feed.is_growing() {
            ((self.feed.observed_width() - self.feed.layout_width()) / 2.0).max(0.0)
        } else {
            0.0
        };
        let column_width = self.feed.column_plan().column_width;

        for (index, item, position) in self.feed.visible_items() {
            let Some(position) = position else {
                continue;
            };
            let Some(geometry) = card_rect(&position, self.scroll_top, x_offset, inner) else {
                continue;
            };
            let content = CardLayout::new(item, column_width);
            render_card(index, item, &content, geometry, buf);
        }
    }
}

/// Draw one card, omitting the border edges that are clipped.
fn render_card(index: usize, item: &Item, content: &CardLayout, geometry: CardRect, buf: &mut Buffer) {
    let CardRect {
        rect,
        top_clipped,
        bot_clipped,
        content_skip,
    } = geometry;

    let borders = match (top_clipped, bot_clipped) {
        (true, true) => Borders::LEFT | Borders::RIGHT,
        (true, false) => Borders::LEFT | Borders::RIGHT | Borders::BOTTOM,
        (false, true) => Borders::LEFT | Borders::RIGHT | Borders::TOP,
        (false, false) => Borders::ALL,
    };
    let block = Block::default()
        .borders(borders)
        .border_style(Theme::card_border_style());
    let ca = block.inner(rect);
    block.render(rect, buf);
    if ca.width == 0 || ca.height == 0 {
        return;
    }

    // Top-border content is hidden along with the border itself.
    let skip = content_skip.saturating_sub(1);
    Paragraph::new(content.lines(ca.width, image_fill(index, item)))
        .scroll((skip, 0))
        .render(ca, buf);
}

/// Placeholder colour (`#rrggbb`) or a stable fallback.
fn image_fill(index: usize, item: &Item) -> Color {
    let parsed = item
        .placeholder
        .as_deref()
        .and_then(|p| p.strip_prefix('#'))
        .filter(|hex| hex.len() == 6)
        .and_then(|hex| u32::from_str_radix(hex, 16).ok());
    match parsed {
        Some(rgb) => Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8),
        None => {
            let seed = match &item.id {
                ItemId::Int(n) => *n,
                ItemId::Str(_) => index as u64,
            };
            Theme::image_fill(seed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_words("amber harbor quiet", 12), vec!["amber harbor", "quiet"]);
        assert_eq!(wrap_words("", 10), Vec::<String>::new());
        assert_eq!(wrap_words("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn natural_height_counts_border_image_title_and_aux() {
        // 240px column: 30 cells, 28 inside the border.
        let item = Item::new(1u64, 300.0, 300.0, "short title")
            .with_extra("author", "mira")
            .with_extra("likes", "12");
        let card = CardLayout::new(&item, 240.0);
        assert_eq!(card.image_rows, 15);
        assert_eq!(card.title, vec!["short title"]);
        assert_eq!(card.aux.as_deref(), Some("@mira  ♥ 12"));
        assert_eq!(card.natural_height(), f64::from(2 + 15 + 1 + 1) * CELL_HEIGHT);
    }

    #[test]
    fn extreme_aspect_ratio_is_capped() {
        let item = Item::new(1u64, 1.0, 1_000_000.0, "a tall panorama title");
        let card = CardLayout::new(&item, 240.0);
        assert_eq!(card.image_rows, MAX_IMAGE_ROWS);
        let height = card.natural_height();
        assert!(height.is_finite());
        assert_eq!(height, f64::from(MAX_IMAGE_ROWS + 1 + 2) * CELL_HEIGHT);
    }

    #[test]
    fn card_rect_clips_against_the_viewport() {
        let inner = Rect::new(1, 1, 100, 20);
        let p = Position {
            top: 16.0,
            left: 80.0,
            width: 240.0,
            height: 160.0,
            column: 0,
        };
        let r = card_rect(&p, 0.0, 0.0, inner).expect("visible");
        assert_eq!(r.rect, Rect::new(11, 2, 30, 10));
        assert!(!r.top_clipped && !r.bot_clipped);

        // Scrolled so the top four rows are hidden.
        let r = card_rect(&p, 80.0, 0.0, inner).expect("visible");
        assert!(r.top_clipped);
        assert_eq!(r.content_skip, 4);
        assert_eq!(r.rect, Rect::new(11, 1, 30, 6));

        assert!(card_rect(&p, 400.0, 0.0, inner).is_none());
    }

    #[test]
    fn centering_offset_shifts_cards() {
        let inner = Rect::new(0, 0, 200, 20);
        let p = Position {
            top: 16.0,
            left: 0.0,
            width: 240.0,
            height: 160.0,
            column: 0,
        };
        let r = card_rect(&p, 0.0, 64.0, inner).expect("visible");
        assert_eq!(r.rect.x, 8);
    }
}
