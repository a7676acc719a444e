//! Cumulative counting statistics.
//!
//! Tracks how much input the counter has processed and how much of it was
//! unusable, so a user can tell a quiet session from a broken camera feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the current process, optionally persisted across runs.
#[derive(Debug)]
pub struct SessionStats {
    /// Frames fed into an exercise session
    frames_processed: AtomicU64,
    /// Frames missing a keypoint the action classifier needs
    frames_degraded: AtomicU64,
    /// Repetitions counted
    reps_counted: AtomicU64,
    /// Records emitted
    records_emitted: AtomicU64,
    /// Programs that ran to completion
    programs_completed: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionStats {
    /// Create empty, unpersisted stats.
    pub fn new() -> Self {
        Self {
            frames_processed: AtomicU64::new(0),
            frames_degraded: AtomicU64::new(0),
            reps_counted: AtomicU64::new(0),
            records_emitted: AtomicU64::new(0),
            programs_completed: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create stats backed by a JSON file, loading any previous totals.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            tracing::warn!("Could not load previous session stats: {e}");
        }

        stats
    }

    /// Record a processed frame.
    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame missing action keypoints.
    pub fn record_degraded_frame(&self) {
        self.frames_degraded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a counted rep.
    pub fn record_rep(&self) {
        self.reps_counted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an emitted record.
    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a program run to completion.
    pub fn record_program_completed(&self) {
        self.programs_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_degraded: self.frames_degraded.load(Ordering::Relaxed),
            reps_counted: self.reps_counted.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            programs_completed: self.programs_completed.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Share of processed frames that were degraded, in percent.
    pub fn degraded_pct(&self) -> f64 {
        let snapshot = self.snapshot();
        if snapshot.frames_processed == 0 {
            0.0
        } else {
            snapshot.frames_degraded as f64 / snapshot.frames_processed as f64 * 100.0
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Frames processed: {}\n\
             - Degraded frames: {} ({:.1}%)\n\
             - Reps counted: {}\n\
             - Records emitted: {}\n\
             - Programs completed: {}\n\
             - Session duration: {} seconds",
            stats.frames_processed,
            stats.frames_degraded,
            self.degraded_pct(),
            stats.reps_counted,
            stats.records_emitted,
            stats.programs_completed,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.snapshot();
            let persisted = PersistedStats {
                frames_processed: stats.frames_processed,
                frames_degraded: stats.frames_degraded,
                reps_counted: stats.reps_counted,
                records_emitted: stats.records_emitted,
                programs_completed: stats.programs_completed,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.frames_processed
                    .store(persisted.frames_processed, Ordering::Relaxed);
                self.frames_degraded
                    .store(persisted.frames_degraded, Ordering::Relaxed);
                self.reps_counted
                    .store(persisted.reps_counted, Ordering::Relaxed);
                self.records_emitted
                    .store(persisted.records_emitted, Ordering::Relaxed);
                self.programs_completed
                    .store(persisted.programs_completed, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.frames_processed.store(0, Ordering::Relaxed);
        self.frames_degraded.store(0, Ordering::Relaxed);
        self.reps_counted.store(0, Ordering::Relaxed);
        self.records_emitted.store(0, Ordering::Relaxed);
        self.programs_completed.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub frames_degraded: u64,
    pub reps_counted: u64,
    pub records_emitted: u64,
    pub programs_completed: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    frames_processed: u64,
    frames_degraded: u64,
    reps_counted: u64,
    records_emitted: u64,
    programs_completed: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create a new shared stats instance.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

/// Create a new shared stats instance with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedSessionStats {
    Arc::new(SessionStats::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = SessionStats::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_frame();
        stats.record_frame();
        stats.record_degraded_frame();
        stats.record_rep();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_processed, 4);
        assert_eq!(snapshot.frames_degraded, 1);
        assert_eq!(snapshot.reps_counted, 1);
        assert!((stats.degraded_pct() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let stats = SessionStats::new();
        stats.record_emitted();
        stats.record_program_completed();
        stats.reset();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records_emitted, 0);
        assert_eq!(snapshot.programs_completed, 0);
        assert_eq!(stats.degraded_pct(), 0.0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("smart-counter-stats-{}", uuid::Uuid::new_v4()))
            .join("stats.json");

        let stats = SessionStats::with_persistence(path.clone());
        stats.record_rep();
        stats.record_rep();
        stats.save().unwrap();

        let reloaded = SessionStats::with_persistence(path.clone());
        assert_eq!(reloaded.snapshot().reps_counted, 2);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_reset_persists() {
        let path = std::env::temp_dir()
            .join(format!("smart-counter-stats-{}", uuid::Uuid::new_v4()))
            .join("stats.json");

        let stats = SessionStats::with_persistence(path.clone());
        stats.record_frame();
        stats.record_rep();
        stats.save().unwrap();

        let stored = SessionStats::with_persistence(path.clone());
        stored.reset();
        stored.save().unwrap();

        let reloaded = SessionStats::with_persistence(path.clone());
        let snapshot = reloaded.snapshot();
        assert_eq!(snapshot.frames_processed, 0);
        assert_eq!(snapshot.reps_counted, 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_summary_format() {
        let summary = SessionStats::new().summary();
        assert!(summary.contains("Frames processed"));
        assert!(summary.contains("Reps counted"));
        assert!(summary.contains("Records emitted"));
    }
}
