//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::time::{Duration, Instant};

use waterfall::core::feed::Feed;

use crate::app::host::{cells_to_px_y, TerminalHost, CELL_HEIGHT};
use crate::config::AppConfig;
use crate::ui::smooth_scroll::SmoothScroll;

pub struct AppState {
    pub feed: Feed,
    /// Observer side of the terminal; feeds events back into `feed`.
    pub host: TerminalHost,
    pub config: AppConfig,
    pub scroll: SmoothScroll,
    /// Feed pane height in rows (for page-sized scrolling).
    pub viewport_rows: u16,
    pub should_quit: bool,
    /// Frame counter (drives the spinner).
    pub tick: u64,
    last_animated: Option<Instant>,
}

/// Animation step interval (~30 fps).
pub const FRAME: Duration = Duration::from_millis(33);

impl AppState {
    pub fn new(feed: Feed, host: TerminalHost, config: AppConfig) -> Self {
        Self {
            scroll: SmoothScroll::new(config.scroll_speed),
            feed,
            host,
            config,
            viewport_rows: 0,
            should_quit: false,
            tick: 0,
            last_animated: None,
        }
    }

    pub fn scroll_step(&self) -> f64 {
        f64::from(self.config.scroll_step_rows) * CELL_HEIGHT
    }

    /// Roughly one screen, keeping a row of context.
    pub fn page_step(&self) -> f64 {
        cells_to_px_y(self.viewport_rows.saturating_sub(1).max(1))
    }

    pub fn scroll_by(&mut self, delta: f64) {
        let max = self.feed.max_scroll();
        self.scroll.scroll_by(delta, max);
    }

    pub fn scroll_to(&mut self, target: f64) {
        let max = self.feed.max_scroll();
        self.scroll.scroll_to(target, max);
    }

    /// Advance the scroll animation (at most once per [`FRAME`]) and report
    /// the new offset.
    pub fn animate(&mut self, now: Instant) {
        if self
            .last_animated
            .is_some_and(|last| now.saturating_duration_since(last) < FRAME)
        {
            return;
        }
        self.last_animated = Some(now);
        self.tick = self.tick.wrapping_add(1);
        self.scroll.clamp(self.feed.max_scroll());
        self.scroll.tick();
        // The host only reports actual changes.
        self.host.scrolled(self.scroll.position());
    }

    /// Start over with a fresh query.
    pub fn reload(&mut self, now: Instant) {
        self.feed.reset(now);
        self.host.forget_measurements();
        self.scroll.scroll_to(0.0, 0.0);
        self.scroll.clamp(0.0);
    }
}
