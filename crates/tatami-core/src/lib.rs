//! Shared primitives for the tatami booking engine.
//!
//! Error taxonomy, mutation scope, configuration loading, and constants used
//! by every other crate in the workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
