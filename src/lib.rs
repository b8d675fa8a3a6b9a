//! Masonry ("waterfall") feed engine.
//!
//! The [`core`] module packs variable-height cards into balanced columns,
//! re-balances them as real heights are measured, decides which cards to
//! materialize for the current scroll position, and asks a data source for
//! the next page when the bottom is approached.  It does not depend on any
//! rendering toolkit; hosts wire it up through the observer traits in
//! [`core::observe`].

pub mod core;
