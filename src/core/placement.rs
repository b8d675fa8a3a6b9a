//! Placement engine: greedy column balancing with incremental re-layout.
//!
//! ## Algorithm
//!
//! Items are visited in display order.  Each goes into the column whose
//! bottom edge is currently highest on screen (smallest height), ties going
//! to the lowest column index.  Every card, including the first in a column,
//! gets `row_gap` above it.  Order is never changed to improve packing.
//!
//! ## Passes
//!
//! * **Full**: zero the column heights and place everything.
//! * **Incremental**: rebuild column heights from the stored positions
//!   before the changed index, then place from that index to the end.
//! * **Extend**: the incremental procedure starting at the first appended
//!   item.
//!
//! Every pass builds a fresh position list and publishes it as one
//! immutable snapshot, so readers never observe a half-updated layout.

use std::sync::Arc;
use std::time::Instant;

use super::columns::ColumnPlan;
use super::estimate::{resolve_height, EstimateHeight};
use super::item::{Item, Position};
use super::measure::{MeasuredHeights, NOISE_THRESHOLD_PX};

// ───────────────────────────────────────── params ────────────

/// Geometry a pass runs with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub columns: usize,
    pub column_width: f64,
    pub gap: f64,
    pub row_gap: f64,
}

impl LayoutParams {
    pub fn from_plan(plan: ColumnPlan, gap: f64, row_gap: f64) -> Self {
        Self {
            columns: plan.columns,
            column_width: plan.column_width,
            gap,
            row_gap,
        }
    }

    /// `false` until the container has been measured.
    pub fn is_placeable(&self) -> bool {
        self.columns > 0 && self.column_width > 0.0
    }
}

/// What a re-layout request actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Height change under the noise threshold; positions untouched.
    Skipped,
    /// Positions from the given index onward were rewritten.
    Incremental(usize),
    Full,
}

// ───────────────────────────────────────── free functions ────

/// Index of the shortest column; ties go to the lowest index.
pub fn shortest_column(column_heights: &[f64]) -> usize {
    let mut index = 0;
    let mut best = column_heights.first().copied().unwrap_or(0.0);
    for (i, &h) in column_heights.iter().enumerate().skip(1) {
        if h < best {
            best = h;
            index = i;
        }
    }
    index
}

/// Stateless full pass.  `height_of(index, item)` supplies each card's
/// height.  Returns an empty list when the geometry is unmeasured.
pub fn layout<F>(items: &[Item], params: LayoutParams, mut height_of: F) -> Vec<Position>
where
    F: FnMut(usize, &Item) -> f64,
{
    if !params.is_placeable() {
        return Vec::new();
    }
    let mut column_heights = vec![0.0; params.columns];
    let mut out = Vec::with_capacity(items.len());
    place_from(items, 0, params, &mut column_heights, &mut out, &mut height_of);
    out
}

/// Core loop shared by every pass: places `items[start..]`, appending to
/// `out` and advancing `column_heights`.
fn place_from<F>(
    items: &[Item],
    start: usize,
    params: LayoutParams,
    column_heights: &mut [f64],
    out: &mut Vec<Position>,
    height_of: &mut F,
) where
    F: FnMut(usize, &Item) -> f64,
{
    for (index, item) in items.iter().enumerate().skip(start) {
        let column = shortest_column(column_heights);
        let top = column_heights[column] + params.row_gap;
        let height = height_of(index, item).max(0.0);
        out.push(Position {
            top,
            left: column as f64 * (params.column_width + params.gap),
            width: params.column_width,
            height,
            column,
        });
        column_heights[column] = top + height;
    }
}

// ───────────────────────────────────────── engine ────────────

/// Owns the layout state of one feed: geometry, the measured-height cache
/// and the published positions.
pub struct PlacementEngine {
    params: LayoutParams,
    estimator: Box<dyn EstimateHeight>,
    measured: MeasuredHeights,
    positions: Arc<[Position]>,
    /// Column bottoms after the last pass.
    column_heights: Vec<f64>,
    revision: u64,
}

impl PlacementEngine {
    pub fn new(estimator: Box<dyn EstimateHeight>, gap: f64, row_gap: f64) -> Self {
        Self {
            params: LayoutParams::from_plan(ColumnPlan::UNMEASURED, gap, row_gap),
            estimator,
            measured: MeasuredHeights::default(),
            positions: Arc::from(Vec::new()),
            column_heights: Vec::new(),
            revision: 0,
        }
    }

    /// Switch to a new column plan.  When the column count or width changes
    /// every measurement is dropped, since card heights depend on width.
    /// Returns `true` if the geometry changed (a full pass is due).
    pub fn set_plan(&mut self, plan: ColumnPlan) -> bool {
        let next = LayoutParams::from_plan(plan, self.params.gap, self.params.row_gap);
        if next == self.params {
            return false;
        }
        if next.columns != self.params.columns || next.column_width != self.params.column_width {
            tracing::debug!(
                "placement: geometry {}x{:.1} -> {}x{:.1}, dropping {} measurements",
                self.params.columns,
                self.params.column_width,
                next.columns,
                next.column_width,
                self.measured.len()
            );
            self.measured.clear();
        }
        self.params = next;
        true
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    /// Latest published positions (indexed like the item sequence).
    pub fn positions(&self) -> Arc<[Position]> {
        Arc::clone(&self.positions)
    }

    pub fn position(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied()
    }

    /// Incremented on every published pass.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bottom of the tallest column.
    pub fn content_height(&self) -> f64 {
        self.column_heights.iter().copied().fold(0.0, f64::max)
    }

    pub fn measured(&self) -> &MeasuredHeights {
        &self.measured
    }

    pub fn record_measurement(&mut self, index: usize, height: f64) {
        self.measured.insert(index, height);
    }

    /// Height the engine currently believes for `index`: measurement, then
    /// stored position, then the estimate.
    pub fn known_height(&self, index: usize, item: &Item) -> f64 {
        if let Some(h) = self.measured.get(index) {
            return h;
        }
        if let Some(p) = self.positions.get(index) {
            return p.height;
        }
        self.estimator.estimate(item, self.params.column_width)
    }

    /// Recompute every position.
    pub fn layout_all(&mut self, items: &[Item]) -> PassOutcome {
        let t0 = Instant::now();
        let params = self.params;
        if !params.is_placeable() {
            self.publish(Vec::new(), Vec::new());
            return PassOutcome::Full;
        }
        let mut column_heights = vec![0.0; params.columns];
        let mut out = Vec::with_capacity(items.len());
        let estimator = self.estimator.as_ref();
        let measured = &self.measured;
        place_from(items, 0, params, &mut column_heights, &mut out, &mut |i, item| {
            resolve_height(estimator, item, params.column_width, measured.get(i))
        });
        self.publish(out, column_heights);
        tracing::trace!("placement: full pass items={} in {:.2?}", items.len(), t0.elapsed());
        PassOutcome::Full
    }

    /// Re-place `items[changed..]` after the height of `changed` moved.
    /// Skips when the move is under the noise threshold; falls back to a
    /// full pass when `changed` has no stored position yet.
    pub fn relayout_from(&mut self, items: &[Item], changed: usize) -> PassOutcome {
        let Some(stored) = self.positions.get(changed).copied() else {
            return self.layout_all(items);
        };
        let Some(item) = items.get(changed) else {
            return self.layout_all(items);
        };
        let next = resolve_height(
            self.estimator.as_ref(),
            item,
            self.params.column_width,
            self.measured.get(changed),
        );
        if (next - stored.height).abs() < NOISE_THRESHOLD_PX {
            return PassOutcome::Skipped;
        }
        self.place_tail(items, changed);
        PassOutcome::Incremental(changed)
    }

    /// Lay out items appended after the last pass.
    pub fn extend(&mut self, items: &[Item]) -> PassOutcome {
        let from = self.positions.len();
        if from == 0 || !self.params.is_placeable() {
            return self.layout_all(items);
        }
        if from >= items.len() {
            return PassOutcome::Skipped;
        }
        self.place_tail(items, from);
        PassOutcome::Incremental(from)
    }

    /// Forget all positions and measurements (new query).
    pub fn clear(&mut self) {
        self.measured.clear();
        self.publish(Vec::new(), Vec::new());
    }

    fn place_tail(&mut self, items: &[Item], start: usize) {
        let t0 = Instant::now();
        let params = self.params;
        let mut column_heights = vec![0.0; params.columns];
        for p in &self.positions[..start] {
            if let Some(h) = column_heights.get_mut(p.column) {
                *h = f64::max(*h, p.bottom());
            }
        }
        let mut out = Vec::with_capacity(items.len());
        out.extend_from_slice(&self.positions[..start]);

        let estimator = self.estimator.as_ref();
        let measured = &self.measured;
        place_from(items, start, params, &mut column_heights, &mut out, &mut |i, item| {
            resolve_height(estimator, item, params.column_width, measured.get(i))
        });
        self.publish(out, column_heights);
        tracing::trace!(
            "placement: pass from {start} items={} in {:.2?}",
            items.len(),
            t0.elapsed()
        );
    }

    fn publish(&mut self, positions: Vec<Position>, column_heights: Vec<f64>) {
        self.positions = Arc::from(positions);
        self.column_heights = column_heights;
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estimate::CardEstimator;
    use crate::core::item::ItemId;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const EPS: f64 = 1e-6;

    /// Estimator that returns a fixed height per integer id.
    struct Fixed(Vec<f64>);

    impl EstimateHeight for Fixed {
        fn estimate(&self, item: &Item, _column_width: f64) -> f64 {
            match item.id {
                ItemId::Int(n) => self.0[n as usize],
                ItemId::Str(_) => 0.0,
            }
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n as u64).map(|i| Item::new(i, 1.0, 1.0, "")).collect()
    }

    fn engine(heights: Vec<f64>, columns: usize, gap: f64) -> PlacementEngine {
        let mut engine = PlacementEngine::new(Box::new(Fixed(heights)), gap, gap);
        engine.set_plan(ColumnPlan {
            columns,
            container_width: 0.0,
            column_width: 100.0,
        });
        engine
    }

    fn assert_no_overlap(positions: &[Position], row_gap: f64) {
        let columns = positions.iter().map(|p| p.column + 1).max().unwrap_or(0);
        for column in 0..columns {
            let in_column: Vec<_> = positions.iter().filter(|p| p.column == column).collect();
            for pair in in_column.windows(2) {
                assert!(
                    pair[1].top >= pair[0].top + pair[0].height + row_gap - EPS,
                    "overlap in column {column}: {:?} then {:?}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn tie_breaks_to_lowest_column_and_keeps_leading_gap() {
        let mut engine = engine(vec![100.0, 200.0, 100.0, 100.0], 3, 10.0);
        let items = items(4);
        engine.layout_all(&items);
        let positions = engine.positions();

        let columns: Vec<_> = positions.iter().map(|p| p.column).collect();
        assert_eq!(columns, vec![0, 1, 2, 0]);

        // First row still gets the row gap above it.
        assert_eq!(positions[0].top, 10.0);
        assert_eq!(positions[1].top, 10.0);
        assert_eq!(positions[2].top, 10.0);
        // Column 0 (bottom 110) ties with column 2 (bottom 110); column 0 wins.
        assert_eq!(positions[3].top, 110.0 + 10.0);
        assert_eq!(positions[3].left, 0.0);
        assert_eq!(positions[1].left, 110.0);
        assert_eq!(positions[2].left, 220.0);
        assert_eq!(engine.content_height(), 220.0);
    }

    #[test]
    fn unmeasured_geometry_yields_no_positions() {
        let mut engine = PlacementEngine::new(Box::new(CardEstimator::default()), 10.0, 10.0);
        engine.layout_all(&items(5));
        assert!(engine.positions().is_empty());

        let positions = layout(
            &items(3),
            LayoutParams {
                columns: 3,
                column_width: 0.0,
                gap: 10.0,
                row_gap: 10.0,
            },
            |_, _| 50.0,
        );
        assert!(positions.is_empty());
    }

    #[test]
    fn random_layouts_never_overlap() {
        let mut rng = StdRng::seed_from_u64(7);
        for columns in 1..6 {
            let heights: Vec<f64> = (0..200).map(|_| rng.gen_range(20.0..600.0)).collect();
            let mut engine = engine(heights, columns, 12.0);
            engine.layout_all(&items(200));
            assert_no_overlap(&engine.positions(), 12.0);
        }
    }

    #[test]
    fn incremental_pass_matches_full_pass() {
        let heights = vec![120.0, 80.0, 200.0, 60.0, 150.0, 90.0, 300.0, 40.0];
        let items = items(heights.len());

        let mut incremental = engine(heights.clone(), 3, 8.0);
        incremental.layout_all(&items);
        incremental.record_measurement(3, 110.0);
        assert_eq!(incremental.relayout_from(&items, 3), PassOutcome::Incremental(3));

        let mut full = engine(heights, 3, 8.0);
        full.record_measurement(3, 110.0);
        full.layout_all(&items);

        assert_eq!(&*incremental.positions(), &*full.positions());
        assert_no_overlap(&incremental.positions(), 8.0);
    }

    #[test]
    fn incremental_pass_leaves_earlier_positions_alone() {
        let heights = vec![100.0; 6];
        let items = items(6);
        let mut engine = engine(heights, 2, 10.0);
        engine.layout_all(&items);
        let before = engine.positions();

        engine.record_measurement(4, 180.0);
        engine.relayout_from(&items, 4);
        let after = engine.positions();
        assert_eq!(&before[..4], &after[..4]);
        assert_eq!(after[4].height, 180.0);
        // The old snapshot is untouched.
        assert_eq!(before[4].height, 100.0);
    }

    #[test]
    fn small_height_change_is_skipped() {
        let items = items(3);
        let mut engine = engine(vec![150.0; 3], 2, 10.0);
        engine.layout_all(&items);
        let revision = engine.revision();
        engine.record_measurement(2, 153.0);
        assert_eq!(engine.relayout_from(&items, 2), PassOutcome::Skipped);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn out_of_range_index_falls_back_to_full_pass() {
        let mut engine = engine(vec![100.0; 4], 2, 10.0);
        let all = items(4);
        engine.layout_all(&all[..2]);
        assert_eq!(engine.relayout_from(&all, 3), PassOutcome::Full);
        assert_eq!(engine.positions().len(), 4);
    }

    #[test]
    fn extend_places_only_the_tail() {
        let heights = vec![100.0, 250.0, 80.0, 120.0, 60.0, 90.0];
        let all = items(6);

        let mut extended = engine(heights.clone(), 2, 10.0);
        extended.layout_all(&all[..3]);
        assert_eq!(extended.extend(&all), PassOutcome::Incremental(3));

        let mut full = engine(heights, 2, 10.0);
        full.layout_all(&all);
        assert_eq!(&*extended.positions(), &*full.positions());
    }

    #[test]
    fn geometry_change_drops_measurements() {
        let mut engine = engine(vec![100.0; 2], 2, 10.0);
        engine.record_measurement(0, 130.0);
        assert!(!engine.set_plan(ColumnPlan {
            columns: 2,
            container_width: 0.0,
            column_width: 100.0,
        }));
        assert_eq!(engine.measured().get(0), Some(130.0));

        assert!(engine.set_plan(ColumnPlan {
            columns: 3,
            container_width: 0.0,
            column_width: 100.0,
        }));
        assert!(engine.measured().is_empty());
    }
}
