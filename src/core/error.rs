//! Error type for the feed engine.
//!
//! Almost every anomaly the engine sees (unmeasured containers, noisy
//! measurements, stale indices) is handled as a policy and never surfaces
//! here.  What remains is configuration mistakes, page-load failures reported
//! by the data source, and sinks whose receiver has gone away.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("invalid feed configuration: {0}")]
    InvalidConfig(String),

    #[error("page {page} (query generation {generation}) failed to load: {reason}")]
    PageLoad {
        generation: u64,
        page: u64,
        reason: String,
    },

    #[error("observer sink closed")]
    ObserverClosed,
}

pub type Result<T> = std::result::Result<T, FeedError>;
