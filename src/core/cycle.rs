//! Debounced two-state rep cycle.
//!
//! ```text
//!            action held > threshold frames
//!   AtRest ──────────────────────────────────▶ InAction
//!     ▲                                           │
//!     └───────────────────────────────────────────┘
//!      initial pose held > threshold frames  (rep completed)
//! ```
//!
//! A break in the run of positive frames resets the counter, so single-frame
//! flicker never causes a transition. There are no timeouts.

use serde::{Deserialize, Serialize};

/// Default number of stable frames a transition must exceed.
pub const DEFAULT_DEBOUNCE_FRAMES: u32 = 3;

/// Phase of the current repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    #[default]
    AtRest,
    InAction,
}

/// A settled state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTransition {
    /// AtRest → InAction
    EnteredAction,
    /// InAction → AtRest; one repetition is done
    RepCompleted,
}

/// Hysteresis state machine for one exercise session.
#[derive(Debug, Clone)]
pub struct RepCycle {
    state: CycleState,
    stable_frames: u32,
    threshold: u32,
}

impl RepCycle {
    /// Create a cycle at rest with the given debounce threshold.
    pub fn new(threshold: u32) -> Self {
        Self {
            state: CycleState::AtRest,
            stable_frames: 0,
            threshold,
        }
    }

    /// Advance by one frame.
    ///
    /// `action_detected` is consulted while at rest and `initial_detected`
    /// while in action.
    pub fn update(
        &mut self,
        initial_detected: bool,
        action_detected: bool,
    ) -> Option<CycleTransition> {
        let (signal, next, transition) = match self.state {
            CycleState::AtRest => (
                action_detected,
                CycleState::InAction,
                CycleTransition::EnteredAction,
            ),
            CycleState::InAction => (
                initial_detected,
                CycleState::AtRest,
                CycleTransition::RepCompleted,
            ),
        };

        if !signal {
            self.stable_frames = 0;
            return None;
        }

        self.stable_frames += 1;
        if self.stable_frames > self.threshold {
            self.state = next;
            self.stable_frames = 0;
            tracing::debug!(state = ?self.state, "rep cycle transition");
            return Some(transition);
        }
        None
    }

    /// Current state.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Length of the current run of positive frames.
    pub fn stable_frames(&self) -> u32 {
        self.stable_frames
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Return to `{AtRest, 0}`.
    pub fn reset(&mut self) {
        self.state = CycleState::AtRest;
        self.stable_frames = 0;
    }
}

impl Default for RepCycle {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_frames_do_not_transition() {
        let mut cycle = RepCycle::new(3);
        for _ in 0..3 {
            assert_eq!(cycle.update(false, true), None);
        }
        assert_eq!(cycle.state(), CycleState::AtRest);
        assert_eq!(cycle.stable_frames(), 3);

        assert_eq!(
            cycle.update(false, true),
            Some(CycleTransition::EnteredAction)
        );
        assert_eq!(cycle.state(), CycleState::InAction);
        assert_eq!(cycle.stable_frames(), 0);
    }

    #[test]
    fn test_flicker_resets_counter() {
        let mut cycle = RepCycle::new(3);
        cycle.update(false, true);
        cycle.update(false, true);
        cycle.update(false, true);
        cycle.update(false, false);
        assert_eq!(cycle.stable_frames(), 0);

        for _ in 0..3 {
            assert_eq!(cycle.update(false, true), None);
        }
        assert_eq!(cycle.state(), CycleState::AtRest);
    }

    #[test]
    fn test_full_rep_fires_once() {
        let mut cycle = RepCycle::new(3);
        let mut reps = 0;
        for _ in 0..4 {
            cycle.update(false, true);
        }
        for _ in 0..10 {
            if cycle.update(true, false) == Some(CycleTransition::RepCompleted) {
                reps += 1;
            }
        }
        assert_eq!(reps, 1);
        assert_eq!(cycle.state(), CycleState::AtRest);
    }

    #[test]
    fn test_ignores_signal_for_other_state() {
        let mut cycle = RepCycle::new(1);
        // Initial pose while at rest does nothing
        for _ in 0..5 {
            assert_eq!(cycle.update(true, false), None);
        }
        assert_eq!(cycle.stable_frames(), 0);
    }

    #[test]
    fn test_reset() {
        let mut cycle = RepCycle::new(0);
        cycle.update(false, true);
        assert_eq!(cycle.state(), CycleState::InAction);
        cycle.reset();
        assert_eq!(cycle.state(), CycleState::AtRest);
        assert_eq!(cycle.stable_frames(), 0);
    }
}
