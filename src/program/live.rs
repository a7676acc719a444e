//! Read-only projection of program state for display.

use crate::core::classifier::ExerciseKind;
use serde::{Deserialize, Serialize};

/// Global phase of a running program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramPhase {
    #[default]
    Exercising,
    Break,
}

/// Counters a display refreshes every frame or tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveCounters {
    pub phase: ProgramPhase,
    pub exercise: Option<ExerciseKind>,
    pub order_num: u32,
    /// 1-based number of the set in progress
    pub set_number: u32,
    pub sets_planned: u32,
    pub rep_count: u32,
    /// Smoothed action score of the latest frame
    pub current_score: u32,
    pub current_peak: u32,
    pub average_score: f64,
    /// Seconds into the current set or break
    pub elapsed: u32,
    /// Seconds left when the set or break is time-bounded
    pub remaining: Option<u32>,
    pub finished: bool,
}

impl LiveCounters {
    /// Clock text: remaining time when bounded, elapsed otherwise.
    pub fn clock(&self) -> String {
        format_clock(self.remaining.unwrap_or(self.elapsed))
    }
}

/// Render seconds as `M:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(90), "1:30");
        assert_eq!(format_clock(725), "12:05");
    }

    #[test]
    fn test_clock_prefers_remaining() {
        let mut live = LiveCounters {
            elapsed: 20,
            ..Default::default()
        };
        assert_eq!(live.clock(), "0:20");

        live.remaining = Some(40);
        assert_eq!(live.clock(), "0:40");
    }
}
