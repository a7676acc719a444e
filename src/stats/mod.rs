//! Session statistics for the counter.
//!
//! Counts what the counter saw and produced, independent of any single
//! program run.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_stats, create_shared_stats_with_persistence, SessionStats, SharedSessionStats,
    StatsSnapshot,
};
