//! Pixel smooth scroll with exponential ease-out.
//!
//! Input moves the *target* offset; each frame the displayed offset closes
//! a fixed fraction of the remaining distance, so long jumps decelerate
//! visibly and the feed receives a burst of scroll events followed by
//! silence (which is what lets the scroll gate settle).

#[derive(Debug, Clone)]
pub struct SmoothScroll {
    position: f64,
    target: f64,
    /// Fraction of the remaining distance covered per tick.
    /// Good range: 0.25–0.45 at 30 fps.
    speed: f64,
}

/// Below this distance the animation snaps to the target.
const SNAP_PX: f64 = 0.5;

impl SmoothScroll {
    pub fn new(speed: f64) -> Self {
        Self {
            position: 0.0,
            target: 0.0,
            speed: speed.clamp(0.05, 0.95),
        }
    }

    pub fn scroll_by(&mut self, delta: f64, max: f64) {
        self.scroll_to(self.target + delta, max);
    }

    pub fn scroll_to(&mut self, target: f64, max: f64) {
        self.target = target.clamp(0.0, max.max(0.0));
    }

    /// Keep both offsets inside `[0, max]` after the content shrank.
    pub fn clamp(&mut self, max: f64) {
        let max = max.max(0.0);
        self.target = self.target.clamp(0.0, max);
        self.position = self.position.clamp(0.0, max);
    }

    /// Advance one frame.  Returns `true` if the displayed offset moved.
    pub fn tick(&mut self) -> bool {
        let remaining = self.target - self.position;
        if remaining == 0.0 {
            return false;
        }
        if remaining.abs() < SNAP_PX {
            self.position = self.target;
        } else {
            self.position += remaining * self.speed;
        }
        true
    }

    /// Displayed offset in layout pixels.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_toward_target_and_snaps() {
        let mut s = SmoothScroll::new(0.5);
        s.scroll_by(100.0, 1000.0);
        assert!(s.tick());
        assert_eq!(s.position(), 50.0);
        assert!(s.tick());
        assert_eq!(s.position(), 75.0);
        for _ in 0..20 {
            s.tick();
        }
        assert_eq!(s.position(), 100.0);
        assert_eq!(s.position(), s.target());
        assert!(!s.tick());
    }

    #[test]
    fn target_is_clamped() {
        let mut s = SmoothScroll::new(0.3);
        s.scroll_by(-50.0, 500.0);
        assert_eq!(s.target(), 0.0);
        s.scroll_to(900.0, 500.0);
        assert_eq!(s.target(), 500.0);
        s.clamp(200.0);
        assert_eq!(s.target(), 200.0);
    }
}
