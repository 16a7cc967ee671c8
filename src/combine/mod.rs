//! Combining modules.

pub mod aggregator;

pub use aggregator::*;
