//! Core engine: column planning, placement, measurement feedback,
//! virtualization and pagination.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Time is
//! passed in explicitly as [`std::time::Instant`] values so every state
//! machine can be driven deterministically from tests.

pub mod columns;
pub mod config;
pub mod error;
pub mod estimate;
pub mod feed;
pub mod item;
pub mod measure;
pub mod observe;
pub mod pagination;
pub mod placement;
pub mod scroll_gate;
pub mod viewport;
