//! Feed controller: one masonry feed, all of its state and timers.
//!
//! ## Architecture
//!
//! * **Inputs**: [`FeedEvent`]s from the host's observers (resize, scroll,
//!   per-card measurements, sentinel visibility) and page results from the
//!   data source, each stamped with the `now` the host observed.
//! * **Timers**: resize debounce, scroll quiescence and pagination
//!   cool-down are deadlines.  [`Feed::next_deadline`] tells the host when
//!   to call [`Feed::poll`]; a newer event simply overwrites a deadline, so
//!   stale scheduled work never stacks up.
//! * **Frames**: [`Feed::frame`] runs once per rendered frame: it flushes
//!   queued measurements (unless the user is scrolling) and recomputes the
//!   visible range if anything moved.
//! * **Outputs**: the published position snapshot, the visible range, and
//!   "positions changed" listener callbacks.
//!
//! Only this type mutates the placement engine, and it does so inside a
//! synchronous call, so every pass is published whole.

use std::sync::Arc;
use std::time::Instant;

use super::columns::{ColumnPlan, ColumnPlanner};
use super::config::FeedConfig;
use super::error::{FeedError, Result};
use super::estimate::{CardEstimator, EstimateHeight};
use super::item::{Item, Page, Position};
use super::measure::{MeasurementFeedback, Verdict};
use super::observe::{EventSink, FeedEvent, ScrollObserver, SizeObserver, Subscription, VisibilityObserver};
use super::pagination::{Delivery, PageLoader, PageRequest, PaginationTrigger};
use super::placement::{PassOutcome, PlacementEngine};
use super::scroll_gate::{GateState, ScrollGate};
use super::viewport::{VirtualWindow, VisibleRange};

/// Handle returned by [`Feed::on_positions_changed`].
pub type ListenerId = u64;

/// Payload of a "positions changed" notification.
#[derive(Debug, Clone)]
pub struct PositionsChanged {
    pub revision: u64,
    pub outcome: PassOutcome,
    pub positions: Arc<[Position]>,
}

type Listener = Box<dyn FnMut(&PositionsChanged)>;

pub struct Feed {
    config: FeedConfig,
    items: Vec<Item>,
    planner: ColumnPlanner,
    engine: PlacementEngine,
    feedback: MeasurementFeedback,
    gate: ScrollGate,
    window: VirtualWindow,
    pagination: PaginationTrigger,
    loader: Box<dyn PageLoader>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
    subscriptions: Vec<Subscription>,
    last_error: Option<FeedError>,
    torn_down: bool,
}

impl Feed {
    /// A feed using the default card estimator.
    pub fn new(config: FeedConfig, loader: Box<dyn PageLoader>) -> Result<Self> {
        Self::with_estimator(config, Box::new(CardEstimator::default()), loader)
    }

    pub fn with_estimator(
        config: FeedConfig,
        estimator: Box<dyn EstimateHeight>,
        loader: Box<dyn PageLoader>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            planner: ColumnPlanner::new(
                config.min_column_width,
                config.min_columns,
                config.column_gap,
                config.resize_debounce,
            ),
            engine: PlacementEngine::new(estimator, config.column_gap, config.row_gap),
            feedback: MeasurementFeedback::default(),
            gate: ScrollGate::new(config.scroll_quiet),
            window: VirtualWindow::new(config.buffer),
            pagination: PaginationTrigger::new(config.pagination_threshold, config.pagination_cooldown),
            config,
            items: Vec::new(),
            loader,
            listeners: Vec::new(),
            next_listener: 0,
            subscriptions: Vec::new(),
            last_error: None,
            torn_down: false,
        })
    }

    // ── host wiring ─────────────────────────────────────────────

    /// Register with the host's size, scroll and visibility observers.  The
    /// subscriptions live until [`Feed::teardown`] (or the feed is dropped).
    pub fn attach<H>(&mut self, sink: &EventSink, host: &mut H)
    where
        H: SizeObserver + ScrollObserver + VisibilityObserver,
    {
        self.subscriptions.push(host.observe_size(sink.clone()));
        self.subscriptions.push(host.observe_scroll(sink.clone()));
        self.subscriptions.push(host.observe_visibility(sink.clone()));
    }

    /// Subscribe to published layout passes.
    pub fn on_positions_changed<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PositionsChanged) + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // ── events ──────────────────────────────────────────────────

    /// Route one observer/data-source event.
    pub fn handle(&mut self, event: FeedEvent, now: Instant) {
        match event {
            FeedEvent::ContainerResized { width, height } => {
                self.on_container_resized(width, height, now);
            }
            FeedEvent::Scrolled { top } => self.on_scroll(top, now),
            FeedEvent::ItemMeasured { index, height } => {
                self.on_measured(index, height);
            }
            FeedEvent::SentinelVisibility { visible } => self.on_sentinel_visibility(visible, now),
            FeedEvent::PageLoaded { request, outcome } => self.on_page_loaded(request, outcome, now),
        }
    }

    pub fn on_container_resized(&mut self, width: f64, height: f64, now: Instant) {
        if self.torn_down {
            return;
        }
        self.window.set_viewport_height(height);
        let observation = self.planner.observe(width, now);
        if let Some(plan) = observation.committed {
            self.apply_plan(plan);
        }
    }

    pub fn on_scroll(&mut self, top: f64, now: Instant) {
        if self.torn_down {
            return;
        }
        self.gate.on_scroll(now);
        self.window.set_scroll_top(top);
    }

    /// A card's rendered height.  Accepted reports are applied on the next
    /// frame after scrolling has settled.
    pub fn on_measured(&mut self, index: usize, height: f64) -> Verdict {
        if self.torn_down {
            return Verdict::OutOfRange;
        }
        self.feedback.on_measured(&mut self.engine, &self.items, index, height)
    }

    pub fn on_sentinel_visibility(&mut self, visible: bool, now: Instant) {
        if self.torn_down {
            return;
        }
        if let Some(request) = self.pagination.on_visibility(visible, now) {
            self.dispatch(request);
        }
    }

    pub fn on_page_loaded(
        &mut self,
        request: PageRequest,
        outcome: std::result::Result<Page, FeedError>,
        now: Instant,
    ) {
        if self.torn_down {
            return;
        }
        match outcome {
            Ok(page) => {
                let delivery = self.pagination.on_page_loaded(request, page.items.len(), page.has_more);
                if delivery == Delivery::Stale {
                    return;
                }
                self.last_error = None;
                if !page.items.is_empty() {
                    let appended = page.items.len();
                    self.items.extend(page.items);
                    let outcome = self.engine.extend(&self.items);
                    tracing::debug!(
                        "feed: page {} appended {appended} items (total {})",
                        request.page,
                        self.items.len()
                    );
                    self.published(outcome);
                }
                let in_view = self.sentinel_in_view();
                if let Some(next) = self.pagination.recheck(in_view, now) {
                    self.dispatch(next);
                }
            }
            Err(err) => {
                if self.pagination.on_page_failed(request) == Delivery::Stale {
                    return;
                }
                tracing::warn!("feed: {err}");
                self.last_error = Some(err);
            }
        }
    }

    // ── timers & frames ─────────────────────────────────────────

    /// Earliest moment [`Feed::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.planner.deadline(),
            self.gate.deadline(),
            self.pagination.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fire every timer whose deadline has passed.
    pub fn poll(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        if let Some(plan) = self.planner.poll(now) {
            self.apply_plan(plan);
        }
        if self.gate.poll(now) && self.feedback.has_pending() {
            self.flush();
        }
        if let Some(request) = self.pagination.poll(now) {
            self.dispatch(request);
        }
    }

    /// Per-frame work: flush queued measurements when not scrolling and
    /// recompute the visible range if it is stale.
    pub fn frame(&mut self, now: Instant) -> VisibleRange {
        if self.torn_down {
            return self.window.range();
        }
        self.poll(now);
        if !self.gate.is_scrolling() && self.feedback.has_pending() {
            self.flush();
        }
        self.window.refresh(&self.engine.positions(), self.items.len());
        self.window.range()
    }

    // ── query lifecycle ─────────────────────────────────────────

    /// Drop all items and start a new query (new generation).  Requests the
    /// first page straight away if the sentinel is on screen.
    pub fn reset(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        let generation = self.pagination.reset();
        tracing::debug!("feed: reset to query generation {generation}");
        self.items.clear();
        self.feedback.clear();
        self.engine.clear();
        self.last_error = None;
        self.published(PassOutcome::Full);
        let in_view = self.sentinel_in_view();
        if let Some(request) = self.pagination.recheck(in_view, now) {
            self.dispatch(request);
        }
    }

    /// Cancel every timer, drop observer subscriptions and listeners.
    /// Later events are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.planner.cancel();
        self.gate.cancel();
        self.pagination.cancel();
        self.feedback.clear();
        self.subscriptions.clear();
        self.listeners.clear();
        tracing::debug!("feed: torn down");
    }

    // ── read side ───────────────────────────────────────────────

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn positions(&self) -> Arc<[Position]> {
        self.engine.positions()
    }

    pub fn revision(&self) -> u64 {
        self.engine.revision()
    }

    /// Range computed at the last frame.
    pub fn visible_range(&self) -> VisibleRange {
        self.window.range()
    }

    /// Items in the visible range with their positions (`None` while the
    /// container is unmeasured and everything renders unplaced).
    pub fn visible_items(&self) -> impl Iterator<Item = (usize, &Item, Option<Position>)> + '_ {
        let range = self.window.range();
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        self.items[start..end]
            .iter()
            .enumerate()
            .map(move |(offset, item)| {
                let index = start + offset;
                (index, item, self.engine.position(index))
            })
    }

    pub fn content_height(&self) -> f64 {
        self.engine.content_height()
    }

    pub fn scroll_top(&self) -> f64 {
        self.window.scroll_top()
    }

    pub fn viewport_height(&self) -> f64 {
        self.window.viewport_height()
    }

    /// Largest meaningful scroll offset.
    pub fn max_scroll(&self) -> f64 {
        (self.content_height() - self.viewport_height()).max(0.0)
    }

    pub fn sentinel_offset(&self) -> f64 {
        self.pagination.sentinel_offset(self.content_height())
    }

    /// Geometric sentinel check against the current scroll window.
    ///
    /// Items held without a layout (no committed columns yet) have no
    /// content height to measure against, so the sentinel only counts as
    /// visible once they are placed.  An empty feed may still ask for its
    /// first page.
    pub fn sentinel_in_view(&self) -> bool {
        if !self.items.is_empty() && self.engine.position(0).is_none() {
            return false;
        }
        self.viewport_height() > 0.0
            && self.sentinel_offset() <= self.scroll_top() + self.viewport_height()
    }

    pub fn column_plan(&self) -> ColumnPlan {
        self.planner.committed()
    }

    /// Width covered by the committed columns.
    pub fn layout_width(&self) -> f64 {
        self.planner.committed().layout_width(self.config.column_gap)
    }

    /// Latest observed container width (may not be committed yet).
    pub fn observed_width(&self) -> f64 {
        self.planner.last_observed().unwrap_or(0.0)
    }

    /// `true` when the most recent resize made the container wider.
    pub fn is_growing(&self) -> bool {
        self.planner.is_growing()
    }

    /// `true` while a resize waits for its debounce period.
    pub fn is_settling(&self) -> bool {
        self.planner.is_settling()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn pending_measurements(&self) -> usize {
        self.feedback.pending_len()
    }

    pub fn measured_height(&self, index: usize) -> Option<f64> {
        self.engine.measured().get(index)
    }

    pub fn is_loading(&self) -> bool {
        self.pagination.is_in_flight()
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more()
    }

    pub fn generation(&self) -> u64 {
        self.pagination.generation()
    }

    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    /// Live observer registrations.
    pub fn observer_count(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ── internals ───────────────────────────────────────────────

    fn apply_plan(&mut self, plan: ColumnPlan) {
        if !self.engine.set_plan(plan) {
            return;
        }
        // Measurements were taken at the old width.
        self.feedback.clear();
        let outcome = self.engine.layout_all(&self.items);
        self.published(outcome);
    }

    fn flush(&mut self) {
        if let Some(outcome) = self.feedback.flush(&mut self.engine, &self.items) {
            if outcome != PassOutcome::Skipped {
                self.published(outcome);
            }
        }
    }

    fn dispatch(&mut self, request: PageRequest) {
        self.loader.load_page(request);
    }

    fn published(&mut self, outcome: PassOutcome) {
        self.window.invalidate();
        if self.listeners.is_empty() {
            return;
        }
        let change = PositionsChanged {
            revision: self.engine.revision(),
            outcome,
            positions: self.engine.positions(),
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<PageRequest>>>);

    impl PageLoader for Recorder {
        fn load_page(&mut self, request: PageRequest) {
            self.0.borrow_mut().push(request);
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = FeedConfig {
            min_columns: 0,
            ..FeedConfig::default()
        };
        assert!(Feed::new(config, Box::new(Recorder::default())).is_err());
    }

    #[test]
    fn next_deadline_is_the_earliest_timer() {
        let mut feed = Feed::new(FeedConfig::default(), Box::new(Recorder::default())).expect("feed");
        let t0 = Instant::now();
        assert_eq!(feed.next_deadline(), None);
        feed.on_container_resized(1000.0, 800.0, t0);
        feed.on_container_resized(1200.0, 800.0, t0);
        feed.on_scroll(10.0, t0);
        assert_eq!(feed.next_deadline(), Some(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn teardown_ignores_later_events_and_listeners() {
        let recorder = Recorder::default();
        let mut feed = Feed::new(FeedConfig::default(), Box::new(recorder.clone())).expect("feed");
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        feed.on_positions_changed(move |_| *seen.borrow_mut() += 1);

        let t0 = Instant::now();
        feed.teardown();
        feed.on_container_resized(1000.0, 800.0, t0);
        feed.on_sentinel_visibility(true, t0);
        assert!(feed.is_torn_down());
        assert_eq!(*calls.borrow(), 0);
        assert!(recorder.0.borrow().is_empty());
        assert_eq!(feed.next_deadline(), None);
    }

    #[test]
    fn teardown_cancels_pending_timers() {
        let recorder = Recorder::default();
        let mut feed = Feed::new(FeedConfig::default(), Box::new(recorder.clone())).expect("feed");
        let t0 = Instant::now();
        feed.on_container_resized(1000.0, 800.0, t0);
        feed.on_container_resized(1200.0, 800.0, t0);
        feed.on_scroll(10.0, t0);
        feed.on_sentinel_visibility(true, t0);
        assert_eq!(recorder.0.borrow().len(), 1);
        assert!(feed.is_settling());
        assert_eq!(feed.gate_state(), GateState::Scrolling);
        assert!(feed.is_loading());

        feed.teardown();
        assert_eq!(feed.next_deadline(), None);
        assert!(!feed.is_settling());
        assert!(!feed.is_loading());

        // Nothing fires once the old deadlines pass.
        feed.poll(t0 + Duration::from_secs(5));
        assert_eq!(recorder.0.borrow().len(), 1);
        assert_eq!(feed.column_plan().columns, 4);
    }
}
