//! Per-set score aggregation.

use serde::{Deserialize, Serialize};

/// Peak score of the rep in progress plus the set's running totals.
///
/// The average is always derived from `total_accumulated / rep_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreTally {
    current_peak: u32,
    total_accumulated: u32,
    rep_count: u32,
}

impl ScoreTally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the current peak if `score` exceeds it.
    pub fn observe(&mut self, score: u32) {
        self.current_peak = self.current_peak.max(score.min(100));
    }

    /// Bank the current peak as a completed rep and return it.
    pub fn complete_rep(&mut self) -> u32 {
        let peak = self.current_peak;
        self.total_accumulated += peak;
        self.rep_count += 1;
        self.current_peak = 0;
        peak
    }

    pub fn current_peak(&self) -> u32 {
        self.current_peak
    }

    pub fn total_accumulated(&self) -> u32 {
        self.total_accumulated
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Mean banked score per rep.
    pub fn average_score(&self) -> f64 {
        average(self.total_accumulated, self.rep_count)
    }

    /// Clear everything for a new set.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// `total / reps`, or 0 when there are no reps.
pub fn average(total: u32, reps: u32) -> f64 {
    if reps == 0 {
        0.0
    } else {
        f64::from(total) / f64::from(reps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tally_average_is_zero() {
        let tally = ScoreTally::new();
        assert_eq!(tally.average_score(), 0.0);
    }

    #[test]
    fn test_peak_is_monotonic_within_rep() {
        let mut tally = ScoreTally::new();
        for score in [20, 55, 72, 60, 10] {
            tally.observe(score);
        }
        assert_eq!(tally.current_peak(), 72);
    }

    #[test]
    fn test_complete_rep_banks_peak() {
        let mut tally = ScoreTally::new();
        tally.observe(72);
        assert_eq!(tally.complete_rep(), 72);
        assert_eq!(tally.current_peak(), 0);
        assert_eq!(tally.total_accumulated(), 72);
        assert_eq!(tally.rep_count(), 1);
        assert_eq!(tally.average_score(), 72.0);

        tally.observe(90);
        tally.complete_rep();
        assert_eq!(tally.rep_count(), 2);
        assert_eq!(tally.average_score(), 81.0);
    }

    #[test]
    fn test_observe_caps_at_100() {
        let mut tally = ScoreTally::new();
        tally.observe(250);
        assert_eq!(tally.current_peak(), 100);
    }

    #[test]
    fn test_reset() {
        let mut tally = ScoreTally::new();
        tally.observe(50);
        tally.complete_rep();
        tally.reset();
        assert_eq!(tally, ScoreTally::default());
    }
}
