//! Height estimation for cards that have not been measured yet.
//!
//! A card is an aspect-ratio image followed by a text block and an
//! author/likes row.  The estimate must be a pure function of
//! `(item, column_width)` so that a layout can be reproduced exactly.

use super::item::Item;

/// Text block allowance when columns are wide enough for short wrapping.
pub const TEXT_BLOCK_HEIGHT: f64 = 44.0;
/// Text block allowance for narrow columns, where titles wrap onto more lines.
pub const TEXT_BLOCK_HEIGHT_NARROW: f64 = 64.0;
/// Columns narrower than this use [`TEXT_BLOCK_HEIGHT_NARROW`].
pub const NARROW_COLUMN_WIDTH: f64 = 300.0;
/// Author / likes row.
pub const AUX_ROW_HEIGHT: f64 = 36.0;

/// Produces a pre-measurement height for an item at a given column width.
pub trait EstimateHeight {
    fn estimate(&self, item: &Item, column_width: f64) -> f64;
}

/// Card metrics for the default estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardEstimator {
    pub text_block: f64,
    pub text_block_narrow: f64,
    pub narrow_below: f64,
    pub aux_row: f64,
}

impl Default for CardEstimator {
    fn default() -> Self {
        Self {
            text_block: TEXT_BLOCK_HEIGHT,
            text_block_narrow: TEXT_BLOCK_HEIGHT_NARROW,
            narrow_below: NARROW_COLUMN_WIDTH,
            aux_row: AUX_ROW_HEIGHT,
        }
    }
}

impl EstimateHeight for CardEstimator {
    fn estimate(&self, item: &Item, column_width: f64) -> f64 {
        let text = if column_width < self.narrow_below {
            self.text_block_narrow
        } else {
            self.text_block
        };
        image_height(item, column_width) + text + self.aux_row
    }
}

/// Image height at `column_width`, preserving the intrinsic aspect ratio.
/// Items without a usable intrinsic size are treated as square.
pub fn image_height(item: &Item, column_width: f64) -> f64 {
    if column_width <= 0.0 {
        return 0.0;
    }
    if item.width > 0.0 && item.height >= 0.0 && item.width.is_finite() && item.height.is_finite() {
        column_width * item.height / item.width
    } else {
        column_width
    }
}

/// Measured height when known, otherwise the estimate.
pub fn resolve_height(
    estimator: &dyn EstimateHeight,
    item: &Item,
    column_width: f64,
    measured: Option<f64>,
) -> f64 {
    match measured {
        Some(h) => h,
        None => estimator.estimate(item, column_width),
    }
}
