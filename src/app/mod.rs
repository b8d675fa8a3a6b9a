//! Application orchestration: state, terminal host, demo data source and
//! input handling.

pub mod event;
pub mod handler;
pub mod host;
pub mod source;
pub mod state;
