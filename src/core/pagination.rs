//! Pagination trigger: infinite scroll without duplicate requests.
//!
//! A sentinel sits `threshold` pixels above the bottom of the laid-out
//! content.  When the host reports it visible, the trigger asks the data
//! source for the next page and then stays "in flight" for a fixed
//! cool-down whether or not the page has arrived, which caps requests at one
//! per cool-down window and keeps a failed request from blocking pagination
//! forever.
//!
//! After a page is appended the feed re-checks the sentinel: if it is still
//! on screen (fast or programmatic scrolling) another request goes out as
//! soon as the cool-down allows.  An empty page or `has_more == false`
//! suspends the trigger until [`PaginationTrigger::reset`] starts a new query.

use std::time::{Duration, Instant};

/// One request for the next page of the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Query generation; results for older generations are discarded.
    pub generation: u64,
    /// Zero-based page number within the query.
    pub page: u64,
}

/// The data source's "load next page" entry point.  Implementations start
/// the load and deliver the result later (as a `PageLoaded` event).
pub trait PageLoader {
    fn load_page(&mut self, request: PageRequest);
}

/// Whether a delivered page belongs to the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// Wrong generation or page; ignore it.
    Stale,
}

#[derive(Debug, Clone)]
pub struct PaginationTrigger {
    threshold: f64,
    cooldown: Duration,
    generation: u64,
    next_page: u64,
    has_more: bool,
    in_flight_until: Option<Instant>,
    /// Sentinel was still visible after an append that landed mid cool-down.
    recheck_pending: bool,
    sentinel_visible: bool,
}

impl PaginationTrigger {
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            generation: 0,
            next_page: 0,
            has_more: true,
            in_flight_until: None,
            recheck_pending: false,
            sentinel_visible: false,
        }
    }

    /// Sentinel offset for the given content height.
    pub fn sentinel_offset(&self, content_height: f64) -> f64 {
        (content_height - self.threshold).max(0.0)
    }

    /// Host visibility notification for the sentinel.
    pub fn on_visibility(&mut self, visible: bool, now: Instant) -> Option<PageRequest> {
        self.sentinel_visible = visible;
        if !visible {
            self.recheck_pending = false;
            return None;
        }
        let request = self.try_fire(now);
        if request.is_none() && self.in_flight_until.is_some() {
            tracing::trace!("pagination: sentinel visible but request in flight");
        }
        request
    }

    /// Clear the in-flight mark once the cool-down has elapsed and fire a
    /// deferred re-check.
    pub fn poll(&mut self, now: Instant) -> Option<PageRequest> {
        if let Some(until) = self.in_flight_until {
            if now < until {
                return None;
            }
            self.in_flight_until = None;
            tracing::trace!("pagination: cool-down elapsed");
        }
        if self.recheck_pending {
            self.recheck_pending = false;
            if self.sentinel_visible {
                return self.try_fire(now);
            }
        }
        None
    }

    /// Account for a delivered page.  `count` is the number of items in it.
    pub fn on_page_loaded(&mut self, request: PageRequest, count: usize, has_more: bool) -> Delivery {
        if !self.is_current(request) {
            tracing::debug!(
                "pagination: dropping stale page {} (generation {}), expected page {} of generation {}",
                request.page,
                request.generation,
                self.next_page,
                self.generation
            );
            return Delivery::Stale;
        }
        self.next_page += 1;
        if count == 0 || !has_more {
            tracing::debug!("pagination: exhausted after page {} ({count} items)", request.page);
            self.has_more = false;
            self.recheck_pending = false;
        }
        Delivery::Accepted
    }

    /// A load failed.  No retry; the cool-down clears the in-flight mark.
    pub fn on_page_failed(&mut self, request: PageRequest) -> Delivery {
        if !self.is_current(request) {
            return Delivery::Stale;
        }
        Delivery::Accepted
    }

    /// Post-append check with the sentinel's visibility recomputed against
    /// the extended layout.
    pub fn recheck(&mut self, visible: bool, now: Instant) -> Option<PageRequest> {
        self.sentinel_visible = visible;
        if !visible || !self.has_more {
            return None;
        }
        if self.in_flight_until.is_some() {
            self.recheck_pending = true;
            return None;
        }
        self.try_fire(now)
    }

    /// Start a new query: new generation, first page, trigger re-armed.
    pub fn reset(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.next_page = 0;
        self.has_more = true;
        self.in_flight_until = None;
        self.recheck_pending = false;
        self.sentinel_visible = false;
        self.generation
    }

    /// Drop timers (teardown).
    pub fn cancel(&mut self) {
        self.in_flight_until = None;
        self.recheck_pending = false;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.in_flight_until
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight_until.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sentinel_visible(&self) -> bool {
        self.sentinel_visible
    }

    fn is_current(&self, request: PageRequest) -> bool {
        request.generation == self.generation && request.page == self.next_page
    }

    fn try_fire(&mut self, now: Instant) -> Option<PageRequest> {
        if !self.has_more || self.in_flight_until.is_some() {
            return None;
        }
        self.in_flight_until = Some(now + self.cooldown);
        let request = PageRequest {
            generation: self.generation,
            page: self.next_page,
        };
        tracing::debug!("pagination: requesting page {} (generation {})", request.page, request.generation);
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(500);

    fn trigger() -> PaginationTrigger {
        PaginationTrigger::new(200.0, COOLDOWN)
    }

    #[test]
    fn one_request_per_cooldown_window() {
        let mut t = trigger();
        let t0 = Instant::now();
        let first = t.on_visibility(true, t0);
        assert_eq!(first, Some(PageRequest { generation: 0, page: 0 }));
        assert_eq!(t.on_visibility(true, t0 + Duration::from_millis(100)), None);
        assert!(t.is_in_flight());
    }

    #[test]
    fn cooldown_clears_in_flight_even_without_a_response() {
        let mut t = trigger();
        let t0 = Instant::now();
        t.on_visibility(true, t0);
        assert_eq!(t.poll(t0 + Duration::from_millis(499)), None);
        assert!(t.is_in_flight());
        assert_eq!(t.poll(t0 + COOLDOWN), None);
        assert!(!t.is_in_flight());
        // The same page is requested again: the first one never arrived.
        assert_eq!(
            t.on_visibility(true, t0 + Duration::from_millis(600)),
            Some(PageRequest { generation: 0, page: 0 })
        );
    }

    #[test]
    fn recheck_after_append_waits_for_cooldown() {
        let mut t = trigger();
        let t0 = Instant::now();
        let req = t.on_visibility(true, t0).expect("first request");
        assert_eq!(t.on_page_loaded(req, 20, true), Delivery::Accepted);

        // Still at the bottom, but the cool-down is running.
        assert_eq!(t.recheck(true, t0 + Duration::from_millis(50)), None);
        let next = t.poll(t0 + COOLDOWN).expect("deferred recheck fires");
        assert_eq!(next.page, 1);
    }

    #[test]
    fn recheck_after_cooldown_fires_immediately() {
        let mut t = trigger();
        let t0 = Instant::now();
        let req = t.on_visibility(true, t0).expect("first request");
        t.poll(t0 + COOLDOWN);
        t.on_page_loaded(req, 20, true);
        assert_eq!(
            t.recheck(true, t0 + Duration::from_millis(700)),
            Some(PageRequest { generation: 0, page: 1 })
        );
    }

    #[test]
    fn scrolling_away_cancels_the_deferred_recheck() {
        let mut t = trigger();
        let t0 = Instant::now();
        let req = t.on_visibility(true, t0).expect("first request");
        t.on_page_loaded(req, 20, true);
        t.recheck(true, t0);
        t.on_visibility(false, t0 + Duration::from_millis(10));
        assert_eq!(t.poll(t0 + COOLDOWN), None);
    }

    #[test]
    fn empty_page_or_no_more_suspends_until_reset() {
        let mut t = trigger();
        let t0 = Instant::now();
        let req = t.on_visibility(true, t0).expect("first request");
        t.on_page_loaded(req, 0, true);
        t.poll(t0 + COOLDOWN);
        assert_eq!(t.on_visibility(true, t0 + Duration::from_secs(2)), None);
        assert!(!t.has_more());

        let generation = t.reset();
        assert_eq!(generation, 1);
        assert_eq!(
            t.on_visibility(true, t0 + Duration::from_secs(3)),
            Some(PageRequest { generation: 1, page: 0 })
        );

        let mut t = trigger();
        let req = t.on_visibility(true, t0).expect("first request");
        t.on_page_loaded(req, 12, false);
        t.poll(t0 + COOLDOWN);
        assert_eq!(t.recheck(true, t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn stale_pages_are_rejected() {
        let mut t = trigger();
        let t0 = Instant::now();
        let old = t.on_visibility(true, t0).expect("first request");
        t.reset();
        assert_eq!(t.on_page_loaded(old, 10, true), Delivery::Stale);
        assert_eq!(t.on_page_failed(old), Delivery::Stale);

        // A duplicate of an already-delivered page is stale too.
        let req = t.on_visibility(true, t0).expect("request after reset");
        assert_eq!(t.on_page_loaded(req, 10, true), Delivery::Accepted);
        assert_eq!(t.on_page_loaded(req, 10, true), Delivery::Stale);
    }

    #[test]
    fn cancel_drops_cooldown_and_deferred_recheck() {
        let mut t = trigger();
        let t0 = Instant::now();
        let req = t.on_visibility(true, t0).expect("first request");
        t.on_page_loaded(req, 20, true);
        assert_eq!(t.recheck(true, t0 + Duration::from_millis(50)), None);
        assert_eq!(t.deadline(), Some(t0 + COOLDOWN));

        t.cancel();
        assert_eq!(t.deadline(), None);
        assert!(!t.is_in_flight());
        assert_eq!(t.poll(t0 + COOLDOWN), None);
    }

    #[test]
    fn sentinel_sits_above_the_bottom() {
        let t = trigger();
        assert_eq!(t.sentinel_offset(1000.0), 800.0);
        assert_eq!(t.sentinel_offset(50.0), 0.0);
    }
}
