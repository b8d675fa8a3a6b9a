//! Virtualization window: which item indices to materialize.
//!
//! Masonry positions are not sorted by `top` across columns, so the window
//! is found with a linear scan over the published positions.  The result is
//! a single contiguous index range padded with a buffer zone above and below
//! the viewport plus one item of slack at the start.

use std::ops::Range;

use super::item::Position;

/// Half-open `[start, end)` range over the item sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Compute the range of items to materialize.
///
/// * No positions (container unmeasured) → everything.
/// * `start` is the first index whose bottom reaches the buffered viewport
///   top, minus one.
/// * `end` is one past the last index intersecting the buffered viewport;
///   when nothing intersects, everything up to `item_count`.
pub fn compute_visible(
    scroll_top: f64,
    container_height: f64,
    positions: &[Position],
    item_count: usize,
    buffer: f64,
) -> VisibleRange {
    if positions.is_empty() {
        return VisibleRange::new(0, item_count);
    }
    let viewport_top = scroll_top - buffer;
    let viewport_bottom = scroll_top + container_height + buffer;

    let mut first = None;
    let mut last = None;
    for (index, p) in positions.iter().enumerate() {
        let bottom = p.bottom();
        if bottom < viewport_top {
            continue;
        }
        if first.is_none() {
            first = Some(index);
        }
        if p.top <= viewport_bottom {
            last = Some(index);
        }
    }

    let start = first.map_or(0, |i| i.saturating_sub(1));
    let end = match last {
        Some(i) => (i + 1).min(item_count),
        None => item_count,
    };
    VisibleRange::new(start.min(end), end)
}

// ───────────────────────────────────────── window state ──────

/// Scroll/size inputs and the last computed range.  Scroll events only mark
/// the window dirty; the range is recomputed once per rendered frame.
#[derive(Debug, Clone)]
pub struct VirtualWindow {
    buffer: f64,
    scroll_top: f64,
    viewport_height: f64,
    range: VisibleRange,
    dirty: bool,
}

impl VirtualWindow {
    pub fn new(buffer: f64) -> Self {
        Self {
            buffer,
            scroll_top: 0.0,
            viewport_height: 0.0,
            range: VisibleRange::default(),
            dirty: true,
        }
    }

    pub fn set_scroll_top(&mut self, top: f64) {
        let top = top.max(0.0);
        if top != self.scroll_top {
            self.scroll_top = top;
            self.dirty = true;
        }
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        if height != self.viewport_height {
            self.viewport_height = height.max(0.0);
            self.dirty = true;
        }
    }

    /// Force a recompute on the next frame (data or positions changed).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute if anything changed since the last frame.  Returns `true`
    /// when the range moved.
    pub fn refresh(&mut self, positions: &[Position], item_count: usize) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        let next = compute_visible(
            self.scroll_top,
            self.viewport_height,
            positions,
            item_count,
            self.buffer,
        );
        let moved = next != self.range;
        self.range = next;
        moved
    }

    pub fn range(&self) -> VisibleRange {
        self.range
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::core::placement::{layout, LayoutParams};
    use crate::core::item::Item;

    /// Single column of 100px cards with 10px gaps: item i spans
    /// [10 + 110i, 110 + 110i].
    fn single_column(n: usize) -> Vec<Position> {
        (0..n)
            .map(|i| Position {
                top: 10.0 + 110.0 * i as f64,
                left: 0.0,
                width: 100.0,
                height: 100.0,
                column: 0,
            })
            .collect()
    }

    #[test]
    fn empty_positions_render_everything() {
        assert_eq!(compute_visible(0.0, 800.0, &[], 17, 500.0), VisibleRange::new(0, 17));
    }

    #[test]
    fn top_of_feed_starts_at_zero() {
        let positions = single_column(100);
        let r = compute_visible(0.0, 300.0, &positions, 100, 0.0);
        assert_eq!(r.start, 0);
        // Items whose top ≤ 300: tops 10, 120, 230 → last index 2.
        assert_eq!(r.end, 3);
    }

    #[test]
    fn buffer_and_slack_widen_the_range() {
        let positions = single_column(100);
        // Viewport [1100, 1400]; buffered [600, 1900].
        let r = compute_visible(1100.0, 300.0, &positions, 100, 500.0);
        // First bottom ≥ 600: index 5 (bottom 660), minus one slack.
        assert_eq!(r.start, 4);
        // Last top ≤ 1900: index 17 (top 1880).
        assert_eq!(r.end, 18);
    }

    #[test]
    fn scrolled_past_everything_renders_all() {
        let positions = single_column(5);
        let r = compute_visible(10_000.0, 300.0, &positions, 5, 0.0);
        assert_eq!(r, VisibleRange::new(0, 5));
    }

    #[test]
    fn range_contains_every_item_overlapping_the_viewport() {
        let mut rng = StdRng::seed_from_u64(11);
        let items: Vec<Item> = (0..300u64).map(|i| Item::new(i, 1.0, 1.0, "")).collect();
        let heights: Vec<f64> = (0..300).map(|_| rng.gen_range(40.0..500.0)).collect();
        let params = LayoutParams {
            columns: 4,
            column_width: 200.0,
            gap: 12.0,
            row_gap: 12.0,
        };
        let positions = layout(&items, params, |i, _| heights[i]);
        let content = positions.iter().map(|p| p.bottom()).fold(0.0, f64::max);

        let mut scroll = 0.0;
        while scroll < content {
            let height = 700.0;
            let r = compute_visible(scroll, height, &positions, items.len(), 500.0);
            for (i, p) in positions.iter().enumerate() {
                let overlaps = p.bottom() >= scroll && p.top <= scroll + height;
                if overlaps {
                    assert!(r.contains(i), "item {i} missing at scroll {scroll}: {r:?}");
                }
            }
            scroll += 137.0;
        }
    }

    #[test]
    fn window_recomputes_once_per_frame() {
        let positions = single_column(50);
        let mut w = VirtualWindow::new(0.0);
        w.set_viewport_height(300.0);
        assert!(w.refresh(&positions, 50));
        assert!(!w.refresh(&positions, 50));

        w.set_scroll_top(500.0);
        w.set_scroll_top(1000.0);
        assert!(w.is_dirty());
        assert!(w.refresh(&positions, 50));
        assert!(w.range().contains(9));
        assert!(!w.is_dirty());
    }
}
