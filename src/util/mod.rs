//! Utility functions module
//!
//! Contains helpers for units formatting and descriptive statistics.

pub mod stats;
pub mod units;

// Re-export commonly used functions
pub use stats::{mean, sample_std_dev};
pub use units::{calculate_throughput_mbps, format_bytes, format_duration, format_throughput};
