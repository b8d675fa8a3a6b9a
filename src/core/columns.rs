//! Column planner: container width → column count and column width.
//!
//! The first real width is committed immediately so the initial paint is
//! right.  After that every observation updates the growing/shrinking flag
//! straight away (hosts use it to centre the stale layout while the user
//! drags a window edge) but the committed plan only moves once the width has
//! been quiet for the debounce period.

use std::time::{Duration, Instant};

// ───────────────────────────────────────── plan ──────────────

/// Result of planning columns for one container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnPlan {
    pub columns: usize,
    /// Available content width the plan was computed for.
    pub container_width: f64,
    /// Width of a single column.
    pub column_width: f64,
}

impl ColumnPlan {
    /// Plan used before the container has a usable width.
    pub const UNMEASURED: ColumnPlan = ColumnPlan {
        columns: 0,
        container_width: 0.0,
        column_width: 0.0,
    };

    pub fn is_measured(&self) -> bool {
        self.columns > 0 && self.column_width > 0.0
    }

    /// Horizontal extent actually covered by the columns and their gaps.
    pub fn layout_width(&self, gap: f64) -> f64 {
        if !self.is_measured() {
            return 0.0;
        }
        self.columns as f64 * self.column_width + gap * (self.columns - 1) as f64
    }
}

impl Default for ColumnPlan {
    fn default() -> Self {
        Self::UNMEASURED
    }
}

/// `columns = max(min_columns, floor((width + gap) / (min_column_width + gap)))`.
///
/// A non-positive container width yields [`ColumnPlan::UNMEASURED`].
pub fn plan(container_width: f64, min_column_width: f64, min_columns: usize, gap: f64) -> ColumnPlan {
    if !container_width.is_finite() || container_width <= 0.0 {
        return ColumnPlan::UNMEASURED;
    }
    let fitting = ((container_width + gap) / (min_column_width + gap)).floor();
    let fitting = if fitting.is_finite() && fitting > 0.0 {
        fitting as usize
    } else {
        0
    };
    let columns = fitting.max(min_columns).max(1);
    let column_width = (container_width - gap * (columns - 1) as f64) / columns as f64;
    if column_width <= 0.0 {
        return ColumnPlan {
            columns,
            container_width,
            column_width: 0.0,
        };
    }
    ColumnPlan {
        columns,
        container_width,
        column_width,
    }
}

// ───────────────────────────────────────── planner ───────────

/// What the host learns immediately from one width observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// `true` when the new width is larger than the previous observation.
    pub growing: bool,
    /// Set only when the observation was committed on the spot (first width).
    pub committed: Option<ColumnPlan>,
}

/// Debounced width → [`ColumnPlan`] state machine.
#[derive(Debug, Clone)]
pub struct ColumnPlanner {
    min_column_width: f64,
    min_columns: usize,
    gap: f64,
    debounce: Duration,
    committed: ColumnPlan,
    has_committed_width: bool,
    last_observed: Option<f64>,
    growing: bool,
    /// Width waiting for the quiet period, with its commit deadline.
    pending: Option<(f64, Instant)>,
}

impl ColumnPlanner {
    pub fn new(min_column_width: f64, min_columns: usize, gap: f64, debounce: Duration) -> Self {
        Self {
            min_column_width,
            min_columns,
            gap,
            debounce,
            committed: ColumnPlan::UNMEASURED,
            has_committed_width: false,
            last_observed: None,
            growing: false,
            pending: None,
        }
    }

    /// Record a container width.  A newer observation replaces any pending
    /// commit and restarts the quiet period.
    pub fn observe(&mut self, width: f64, now: Instant) -> Observation {
        self.growing = self.last_observed.is_some_and(|prev| width > prev);
        self.last_observed = Some(width);

        if !self.has_committed_width && width > 0.0 {
            self.has_committed_width = true;
            self.pending = None;
            self.committed = self.plan_for(width);
            tracing::debug!(
                "columns: initial commit width={width} columns={}",
                self.committed.columns
            );
            return Observation {
                growing: self.growing,
                committed: Some(self.committed),
            };
        }

        self.pending = Some((width, now + self.debounce));
        Observation {
            growing: self.growing,
            committed: None,
        }
    }

    /// Commit the pending width if its quiet period has elapsed.  Returns the
    /// new plan only when it differs from the previously committed one.
    pub fn poll(&mut self, now: Instant) -> Option<ColumnPlan> {
        let (width, deadline) = self.pending?;
        if now < deadline {
            return None;
        }
        self.pending = None;
        let next = self.plan_for(width);
        if next == self.committed {
            return None;
        }
        tracing::debug!(
            "columns: commit width={width} columns {} -> {}",
            self.committed.columns,
            next.columns
        );
        self.committed = next;
        Some(next)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// Drop any pending commit.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn committed(&self) -> ColumnPlan {
        self.committed
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// `true` while a width is waiting to be committed.
    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_observed(&self) -> Option<f64> {
        self.last_observed
    }

    fn plan_for(&self, width: f64) -> ColumnPlan {
        plan(width, self.min_column_width, self.min_columns, self.gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn planner() -> ColumnPlanner {
        ColumnPlanner::new(200.0, 2, 10.0, DEBOUNCE)
    }

    #[test]
    fn plan_follows_formula() {
        // (1000 + 10) / (200 + 10) = 4.8 → 4 columns.
        let p = plan(1000.0, 200.0, 2, 10.0);
        assert_eq!(p.columns, 4);
        assert!((p.column_width - (1000.0 - 30.0) / 4.0).abs() < 1e-9);
        assert!((p.layout_width(10.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn plan_respects_min_columns() {
        let p = plan(250.0, 200.0, 2, 10.0);
        assert_eq!(p.columns, 2);
        assert!((p.column_width - 120.0).abs() < 1e-9);
    }

    #[test]
    fn zero_width_is_unmeasured() {
        assert_eq!(plan(0.0, 200.0, 2, 10.0), ColumnPlan::UNMEASURED);
        assert!(!plan(-5.0, 200.0, 2, 10.0).is_measured());
    }

    #[test]
    fn column_count_is_monotonic_and_bounded() {
        let mut prev = 0;
        let mut width = 200.0;
        while width < 4000.0 {
            let columns = plan(width, 200.0, 2, 16.0).columns;
            assert!(columns >= 2);
            assert!(columns >= prev, "columns dropped at width {width}");
            prev = columns;
            width += 7.5;
        }
    }

    #[test]
    fn first_observation_commits_immediately() {
        let mut p = planner();
        let now = Instant::now();
        let obs = p.observe(1000.0, now);
        assert_eq!(obs.committed.map(|c| c.columns), Some(4));
        assert!(!obs.growing);
        assert_eq!(p.deadline(), None);
    }

    #[test]
    fn later_observations_are_debounced_from_the_last_one() {
        let mut p = planner();
        let t0 = Instant::now();
        p.observe(1000.0, t0);

        let obs = p.observe(1300.0, t0 + Duration::from_millis(10));
        assert!(obs.growing);
        assert!(obs.committed.is_none());

        // A second observation restarts the window.
        let obs = p.observe(600.0, t0 + Duration::from_millis(80));
        assert!(!obs.growing);
        assert_eq!(p.poll(t0 + Duration::from_millis(150)), None);
        assert_eq!(p.committed().columns, 4);

        let committed = p.poll(t0 + Duration::from_millis(180)).expect("commit");
        assert_eq!(committed.columns, 2);
        assert_eq!(p.committed().columns, 2);
        assert!(!p.is_settling());
    }

    #[test]
    fn unchanged_width_commit_is_silent() {
        let mut p = planner();
        let t0 = Instant::now();
        p.observe(1000.0, t0);
        p.observe(1000.0, t0 + Duration::from_millis(5));
        assert_eq!(p.poll(t0 + Duration::from_millis(200)), None);
        assert!(!p.is_settling());
    }

    #[test]
    fn zero_width_does_not_count_as_first_observation() {
        let mut p = planner();
        let t0 = Instant::now();
        assert!(p.observe(0.0, t0).committed.is_none());
        let obs = p.observe(800.0, t0 + Duration::from_millis(1));
        assert!(obs.committed.is_some());
    }

    #[test]
    fn cancel_drops_pending_commit() {
        let mut p = planner();
        let t0 = Instant::now();
        p.observe(1000.0, t0);
        p.observe(500.0, t0);
        p.cancel();
        assert_eq!(p.poll(t0 + Duration::from_secs(1)), None);
        assert_eq!(p.committed().columns, 4);
    }
}
