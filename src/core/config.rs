//! Caller-supplied tuning parameters.
//!
//! Everything is a plain number with a documented default; the engine never
//! reads the environment or a config file on its own.

use std::time::Duration;

use super::error::{FeedError, Result};

/// Default spacing between columns, in layout pixels.
pub const DEFAULT_COLUMN_GAP: f64 = 16.0;
/// Default spacing above every card in a column.
pub const DEFAULT_ROW_GAP: f64 = 16.0;
pub const DEFAULT_MIN_COLUMN_WIDTH: f64 = 236.0;
pub const DEFAULT_MIN_COLUMNS: usize = 2;
/// Extra margin above and below the viewport that is still materialized.
pub const DEFAULT_BUFFER: f64 = 500.0;
/// Distance of the pagination sentinel above the true content bottom.
pub const DEFAULT_PAGINATION_THRESHOLD: f64 = 200.0;
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);
pub const DEFAULT_SCROLL_QUIET: Duration = Duration::from_millis(150);
pub const DEFAULT_PAGINATION_COOLDOWN: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub column_gap: f64,
    pub row_gap: f64,
    pub min_column_width: f64,
    pub min_columns: usize,
    pub buffer: f64,
    pub pagination_threshold: f64,
    pub resize_debounce: Duration,
    pub scroll_quiet: Duration,
    pub pagination_cooldown: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            column_gap: DEFAULT_COLUMN_GAP,
            row_gap: DEFAULT_ROW_GAP,
            min_column_width: DEFAULT_MIN_COLUMN_WIDTH,
            min_columns: DEFAULT_MIN_COLUMNS,
            buffer: DEFAULT_BUFFER,
            pagination_threshold: DEFAULT_PAGINATION_THRESHOLD,
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            scroll_quiet: DEFAULT_SCROLL_QUIET,
            pagination_cooldown: DEFAULT_PAGINATION_COOLDOWN,
        }
    }
}

impl FeedConfig {
    /// Reject values the layout math cannot work with.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("column_gap", self.column_gap),
            ("row_gap", self.row_gap),
            ("buffer", self.buffer),
            ("pagination_threshold", self.pagination_threshold),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(FeedError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.min_column_width.is_finite() || self.min_column_width <= 0.0 {
            return Err(FeedError::InvalidConfig(format!(
                "min_column_width must be positive, got {}",
                self.min_column_width
            )));
        }
        if self.min_columns == 0 {
            return Err(FeedError::InvalidConfig(
                "min_columns must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FeedConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_gap_and_zero_columns() {
        let cfg = FeedConfig {
            column_gap: -1.0,
            ..FeedConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(FeedError::InvalidConfig(_))));

        let cfg = FeedConfig {
            min_columns: 0,
            ..FeedConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = FeedConfig {
            min_column_width: f64::NAN,
            ..FeedConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
