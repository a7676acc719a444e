//! Rolling-window smoothing of classifier output.
//!
//! Each smoother is bound to one classifier within one exercise session and
//! is dropped with it, so history never leaks between sessions.

use crate::core::classifier::ClassifierResult;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Default number of frames in the smoothing window.
pub const DEFAULT_WINDOW: usize = 5;

/// Majority-voted detection and averaged score over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SmoothedResult {
    pub detected: bool,
    /// Rounded mean score in [0, 100]
    pub score: u32,
}

/// Bounded FIFO of recent classifier results.
#[derive(Debug, Clone)]
pub struct Smoother {
    window: usize,
    history: VecDeque<ClassifierResult>,
}

impl Smoother {
    /// Create a smoother over `window` frames. A zero window is treated as 1.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Push a new result, evicting the oldest once the window is full, and
    /// return the smoothed value.
    pub fn push(&mut self, result: ClassifierResult) -> SmoothedResult {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(result);
        self.current()
    }

    /// Smoothed value over whatever history is available.
    pub fn current(&self) -> SmoothedResult {
        if self.history.is_empty() {
            return SmoothedResult::default();
        }

        let len = self.history.len();
        let detected_count = self.history.iter().filter(|r| r.detected).count();
        let mean = self.history.iter().map(|r| finite_score(r.score)).mean();

        SmoothedResult {
            detected: detected_count * 2 > len,
            score: round_score(mean),
        }
    }

    /// Number of results currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Window capacity.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

fn finite_score(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        tracing::warn!(score, "non-finite classifier score treated as 0");
        0.0
    }
}

/// Round a score into the integer [0, 100] range; non-finite becomes 0.
pub(crate) fn round_score(score: f64) -> u32 {
    if score.is_finite() {
        score.clamp(0.0, 100.0).round() as u32
    } else {
        0
    }
}
