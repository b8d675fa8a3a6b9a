//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer reads the feed's published positions and visible range and
//! turns them into cells on the terminal.  It never mutates the feed.

pub mod feed_widget;
pub mod layout;
pub mod smooth_scroll;
pub mod spinner;
pub mod theme;
