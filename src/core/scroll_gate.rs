//! Scroll quiescence gate.
//!
//! Layout passes during an active scroll cause visible jank, so the feed
//! holds them back while scroll events keep arriving and releases them once
//! the scroll position has been still for the quiet period.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Scrolling,
}

#[derive(Debug, Clone)]
pub struct ScrollGate {
    quiet: Duration,
    state: GateState,
    /// When the gate returns to idle if no further scroll arrives.
    settle_at: Option<Instant>,
}

impl ScrollGate {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            state: GateState::Idle,
            settle_at: None,
        }
    }

    /// Any scroll event: enter (or stay in) `Scrolling` and restart the timer.
    pub fn on_scroll(&mut self, now: Instant) {
        if self.state == GateState::Idle {
            tracing::trace!("scroll gate: idle -> scrolling");
        }
        self.state = GateState::Scrolling;
        self.settle_at = Some(now + self.quiet);
    }

    /// Returns `true` exactly once, on the transition back to `Idle`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.settle_at {
            Some(at) if now >= at => {
                self.settle_at = None;
                self.state = GateState::Idle;
                tracing::trace!("scroll gate: scrolling -> idle");
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_scrolling(&self) -> bool {
        self.state == GateState::Scrolling
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.settle_at
    }

    /// Drop the timer and return to idle without signalling.
    pub fn cancel(&mut self) {
        self.settle_at = None;
        self.state = GateState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(150);

    #[test]
    fn settles_after_quiet_period() {
        let mut gate = ScrollGate::new(QUIET);
        let t0 = Instant::now();
        assert_eq!(gate.state(), GateState::Idle);

        gate.on_scroll(t0);
        assert!(gate.is_scrolling());
        assert!(!gate.poll(t0 + Duration::from_millis(100)));
        assert!(gate.poll(t0 + Duration::from_millis(150)));
        assert_eq!(gate.state(), GateState::Idle);
        // Only signalled once.
        assert!(!gate.poll(t0 + Duration::from_millis(400)));
    }

    #[test]
    fn further_scrolls_restart_the_timer() {
        let mut gate = ScrollGate::new(QUIET);
        let t0 = Instant::now();
        gate.on_scroll(t0);
        gate.on_scroll(t0 + Duration::from_millis(120));
        assert!(!gate.poll(t0 + Duration::from_millis(200)));
        assert!(gate.is_scrolling());
        assert_eq!(gate.deadline(), Some(t0 + Duration::from_millis(270)));
        assert!(gate.poll(t0 + Duration::from_millis(270)));
    }

    #[test]
    fn cancel_returns_to_idle_silently() {
        let mut gate = ScrollGate::new(QUIET);
        let t0 = Instant::now();
        gate.on_scroll(t0);
        gate.cancel();
        assert!(!gate.is_scrolling());
        assert!(!gate.poll(t0 + Duration::from_secs(1)));
    }
}
