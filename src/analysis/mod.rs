//! Analysis modules.
//!
//! Aggregation of telemetry rows into per-feature usage maps.

pub mod aggregator;

pub use aggregator::*;
