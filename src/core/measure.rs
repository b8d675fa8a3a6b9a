//! Measurement feedback: real rendered heights flowing back into layout.
//!
//! Renderers report each card's height whenever it changes.  Reports that
//! barely move the height are noise; reports that move it by more than half
//! are treated as a transient bad read (e.g. a zero height while mounting).
//! Accepted reports land in the [`MeasuredHeights`] cache and queue the index
//! for the next flush, which performs a single pass for the whole batch.

use std::collections::{BTreeSet, HashMap};

use super::item::Item;
use super::placement::{PassOutcome, PlacementEngine};

/// Height changes smaller than this are ignored.
pub const NOISE_THRESHOLD_PX: f64 = 5.0;
/// Relative changes larger than this are rejected as spurious.
pub const OUTLIER_RATIO: f64 = 0.5;

// ───────────────────────────────────────── cache ─────────────

/// Last known real height per item index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasuredHeights {
    heights: HashMap<usize, f64>,
}

impl MeasuredHeights {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.heights.get(&index).copied()
    }

    pub fn insert(&mut self, index: usize, height: f64) {
        self.heights.insert(index, height);
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

// ───────────────────────────────────────── filter ────────────

/// What happened to one measurement report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Under [`NOISE_THRESHOLD_PX`].
    Noise,
    /// Over [`OUTLIER_RATIO`] of the last known height, or not a number.
    Outlier,
    /// No item at that index.
    OutOfRange,
}

/// Apply the noise and outlier rules to a report against the last known
/// height.
pub fn classify(last_known: f64, height: f64) -> Verdict {
    if !height.is_finite() {
        return Verdict::Outlier;
    }
    let delta = (height - last_known).abs();
    if delta < NOISE_THRESHOLD_PX {
        return Verdict::Noise;
    }
    if last_known > 0.0 && delta / last_known > OUTLIER_RATIO {
        return Verdict::Outlier;
    }
    Verdict::Accepted
}

// ───────────────────────────────────────── feedback loop ─────

/// Pending-update set plus the flush policy.
#[derive(Debug, Default)]
pub struct MeasurementFeedback {
    pending: BTreeSet<usize>,
}

impl MeasurementFeedback {
    /// Filter a report and, if accepted, record it and queue `index`.
    pub fn on_measured(
        &mut self,
        engine: &mut PlacementEngine,
        items: &[Item],
        index: usize,
        height: f64,
    ) -> Verdict {
        let Some(item) = items.get(index) else {
            return Verdict::OutOfRange;
        };
        let last_known = engine.known_height(index, item);
        let verdict = classify(last_known, height);
        match verdict {
            Verdict::Accepted => {
                engine.record_measurement(index, height);
                self.pending.insert(index);
            }
            Verdict::Noise => {
                tracing::trace!("measure: noise index={index} {last_known:.1} -> {height:.1}");
            }
            Verdict::Outlier => {
                tracing::debug!("measure: outlier index={index} {last_known:.1} -> {height:.1}");
            }
            Verdict::OutOfRange => {}
        }
        verdict
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain the pending set with one pass: incremental for a single index,
    /// full for several.  Returns `None` when nothing was pending.
    pub fn flush(&mut self, engine: &mut PlacementEngine, items: &[Item]) -> Option<PassOutcome> {
        let pending = std::mem::take(&mut self.pending);
        let mut indices = pending.into_iter();
        let first = indices.next()?;
        let outcome = if indices.next().is_some() {
            engine.layout_all(items)
        } else {
            engine.relayout_from(items, first)
        };
        tracing::debug!("measure: flush -> {outcome:?}");
        Some(outcome)
    }

    /// Forget queued indices (their measurements were invalidated).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::columns::ColumnPlan;
    use crate::core::estimate::EstimateHeight;

    struct Flat(f64);

    impl EstimateHeight for Flat {
        fn estimate(&self, _item: &Item, _column_width: f64) -> f64 {
            self.0
        }
    }

    fn setup(n: usize) -> (PlacementEngine, Vec<Item>) {
        let mut engine = PlacementEngine::new(Box::new(Flat(150.0)), 10.0, 10.0);
        engine.set_plan(ColumnPlan {
            columns: 2,
            container_width: 210.0,
            column_width: 100.0,
        });
        let items: Vec<Item> = (0..n as u64).map(|i| Item::new(i, 1.0, 1.0, "")).collect();
        engine.layout_all(&items);
        (engine, items)
    }

    #[test]
    fn one_pixel_change_is_noise() {
        let (mut engine, items) = setup(4);
        let mut fb = MeasurementFeedback::default();
        assert_eq!(fb.on_measured(&mut engine, &items, 2, 151.0), Verdict::Noise);
        assert!(!fb.has_pending());
        assert_eq!(fb.flush(&mut engine, &items), None);
    }

    #[test]
    fn large_jump_is_rejected_as_outlier() {
        let (mut engine, items) = setup(4);
        let mut fb = MeasurementFeedback::default();
        assert_eq!(fb.on_measured(&mut engine, &items, 2, 400.0), Verdict::Outlier);
        assert_eq!(engine.measured().get(2), None);
        assert!(!fb.has_pending());
    }

    #[test]
    fn transient_zero_read_is_rejected() {
        let (mut engine, items) = setup(4);
        let mut fb = MeasurementFeedback::default();
        assert_eq!(fb.on_measured(&mut engine, &items, 1, 0.0), Verdict::Outlier);
        assert_eq!(fb.on_measured(&mut engine, &items, 1, f64::NAN), Verdict::Outlier);
    }

    #[test]
    fn single_pending_index_flushes_incrementally() {
        let (mut engine, items) = setup(6);
        let mut fb = MeasurementFeedback::default();
        assert_eq!(fb.on_measured(&mut engine, &items, 3, 190.0), Verdict::Accepted);
        assert_eq!(fb.flush(&mut engine, &items), Some(PassOutcome::Incremental(3)));
        assert!(!fb.has_pending());
        assert_eq!(engine.position(3).map(|p| p.height), Some(190.0));
    }

    #[test]
    fn several_pending_indices_flush_with_one_full_pass() {
        let (mut engine, items) = setup(6);
        let mut fb = MeasurementFeedback::default();
        fb.on_measured(&mut engine, &items, 1, 120.0);
        fb.on_measured(&mut engine, &items, 4, 200.0);
        assert_eq!(fb.pending_len(), 2);
        assert_eq!(fb.flush(&mut engine, &items), Some(PassOutcome::Full));
        assert_eq!(fb.pending_len(), 0);
    }

    #[test]
    fn later_reports_compare_against_the_measurement() {
        let (mut engine, items) = setup(3);
        let mut fb = MeasurementFeedback::default();
        fb.on_measured(&mut engine, &items, 0, 200.0);
        // 200 → 203 is noise relative to the measurement, not the estimate.
        assert_eq!(fb.on_measured(&mut engine, &items, 0, 203.0), Verdict::Noise);
    }

    #[test]
    fn out_of_range_report_is_ignored() {
        let (mut engine, items) = setup(3);
        let mut fb = MeasurementFeedback::default();
        assert_eq!(fb.on_measured(&mut engine, &items, 9, 100.0), Verdict::OutOfRange);
    }
}
