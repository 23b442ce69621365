//! Command handlers -- one module per subcommand
//!
//! Each handler follows the same shape: load inputs, run the mining
//! engine and optional annotation stages, then hand a payload to the
//! [`OutputWriter`](crate::output::OutputWriter) for rendering.

pub mod config;
pub mod dlt;
pub mod mine;
pub mod render;
pub mod stages;
