//! Terminal host: the feed's window onto the terminal.
//!
//! Implements the engine's observer seams on top of terminal cells.  Every
//! cell is treated as [`CELL_WIDTH`] × [`CELL_HEIGHT`] layout pixels, so
//! the engine's pixel defaults (236px columns, 16px gaps) produce sensible
//! terminal layouts.  Like their browser counterparts, the observers only
//! report changes.

use std::collections::HashMap;

use ratatui::layout::Rect;
use waterfall::core::observe::{
    EventSink, FeedEvent, ScrollObserver, SizeObserver, Subscription, VisibilityObserver,
};

pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;

pub fn cells_to_px_x(cells: u16) -> f64 {
    f64::from(cells) * CELL_WIDTH
}

pub fn cells_to_px_y(cells: u16) -> f64 {
    f64::from(cells) * CELL_HEIGHT
}

#[derive(Debug, Default)]
pub struct TerminalHost {
    size: Option<EventSink>,
    scroll: Option<EventSink>,
    visibility: Option<EventSink>,
    area: Option<(u16, u16)>,
    scroll_top: Option<f64>,
    sentinel_visible: Option<bool>,
    /// Last natural height reported per index, with the column width it
    /// was measured at.
    reported: HashMap<usize, (f64, f64)>,
}

impl TerminalHost {
    /// The feed container now covers `area`.
    pub fn resized(&mut self, area: Rect) {
        let dims = (area.width, area.height);
        if self.area == Some(dims) {
            return;
        }
        self.area = Some(dims);
        emit(
            &self.size,
            FeedEvent::ContainerResized {
                width: cells_to_px_x(area.width),
                height: cells_to_px_y(area.height),
            },
        );
    }

    pub fn scrolled(&mut self, top: f64) {
        if self.scroll_top == Some(top) {
            return;
        }
        self.scroll_top = Some(top);
        emit(&self.scroll, FeedEvent::Scrolled { top });
    }

    /// A rendered card's natural height at `column_width`.  Repeats of the
    /// same report are swallowed.
    pub fn measured(&mut self, index: usize, column_width: f64, height: f64) {
        if self.reported.get(&index) == Some(&(column_width, height)) {
            return;
        }
        self.reported.insert(index, (column_width, height));
        emit(&self.size, FeedEvent::ItemMeasured { index, height });
    }

    /// Forget what was reported (the item sequence was replaced).
    pub fn forget_measurements(&mut self) {
        self.reported.clear();
    }

    /// Geometric intersection result for the pagination sentinel.
    pub fn sentinel(&mut self, visible: bool) {
        if self.sentinel_visible == Some(visible) {
            return;
        }
        self.sentinel_visible = Some(visible);
        emit(&self.visibility, FeedEvent::SentinelVisibility { visible });
    }
}

fn emit(sink: &Option<EventSink>, event: FeedEvent) {
    let Some(sink) = sink else {
        return;
    };
    if sink.send(event).is_err() {
        tracing::trace!("host: observer inactive, event dropped");
    }
}

impl SizeObserver for TerminalHost {
    fn observe_size(&mut self, sink: EventSink) -> Subscription {
        let (sink, subscription) = sink.scoped("size");
        self.size = Some(sink);
        // A new observer gets the current size straight away.
        if let Some((width, height)) = self.area.take() {
            self.resized(Rect::new(0, 0, width, height));
        }
        subscription
    }
}

impl ScrollObserver for TerminalHost {
    fn observe_scroll(&mut self, sink: EventSink) -> Subscription {
        let (sink, subscription) = sink.scoped("scroll");
        self.scroll = Some(sink);
        // Containers start at the top; only movement is reported.
        self.scroll_top.get_or_insert(0.0);
        subscription
    }
}

impl VisibilityObserver for TerminalHost {
    fn observe_visibility(&mut self, sink: EventSink) -> Subscription {
        let (sink, subscription) = sink.scoped("visibility");
        self.visibility = Some(sink);
        self.sentinel_visible = None;
        subscription
    }
}
