//! Shared runtime helpers for the crudkit workspace.
//!
//! - `utils::logging`: tracing subscriber bootstrap.
//! - `env`: data directory checks performed before a file-backed store opens.

pub mod utils;
pub mod env;
