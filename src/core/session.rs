//! One exercise session: classifier pair, smoothers, rep cycle and tally.

use crate::config::DetectionConfig;
use crate::core::classifier::{ExerciseKind, ExercisePoses};
use crate::core::cycle::{CycleState, CycleTransition, RepCycle};
use crate::core::smoother::{SmoothedResult, Smoother};
use crate::core::tally::ScoreTally;
use crate::pose::Frame;

/// What a single frame did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub initial: SmoothedResult,
    pub action: SmoothedResult,
    pub state: CycleState,
    pub transition: Option<CycleTransition>,
    /// Banked peak score when this frame completed a rep
    pub rep_score: Option<u32>,
    /// The action classifier lacked a required keypoint
    pub degraded: bool,
}

/// Live counting state for one exercise.
///
/// Smoother history belongs to the session and is dropped with it.
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    kind: ExerciseKind,
    poses: ExercisePoses,
    initial_smoother: Smoother,
    action_smoother: Smoother,
    cycle: RepCycle,
    tally: ScoreTally,
    current_score: u32,
}

impl ExerciseSession {
    /// Create a fresh session for one exercise.
    pub fn new(kind: ExerciseKind, config: &DetectionConfig) -> Self {
        Self {
            kind,
            poses: kind.poses(config),
            initial_smoother: Smoother::new(config.smoothing_window),
            action_smoother: Smoother::new(config.smoothing_window),
            cycle: RepCycle::new(config.debounce_frames),
            tally: ScoreTally::new(),
            current_score: 0,
        }
    }

    /// Classify, smooth and advance the rep cycle by one frame.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameOutcome {
        let degraded = self.poses.action.is_degraded(frame);

        let initial = self.initial_smoother.push(self.poses.initial.classify(frame));
        let action = self.action_smoother.push(self.poses.action.classify(frame));

        self.current_score = action.score;
        self.tally.observe(action.score);

        let transition = self.cycle.update(initial.detected, action.detected);
        let rep_score = match transition {
            Some(CycleTransition::RepCompleted) => {
                let score = self.tally.complete_rep();
                tracing::debug!(
                    exercise = %self.kind,
                    reps = self.tally.rep_count(),
                    score,
                    "rep completed"
                );
                Some(score)
            }
            _ => None,
        };

        FrameOutcome {
            initial,
            action,
            state: self.cycle.state(),
            transition,
            rep_score,
            degraded,
        }
    }

    /// Start over for a new set.
    pub fn reset(&mut self) {
        self.initial_smoother.clear();
        self.action_smoother.clear();
        self.cycle.reset();
        self.tally.reset();
        self.current_score = 0;
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    /// Score totals for the current set.
    pub fn tally(&self) -> &ScoreTally {
        &self.tally
    }

    pub fn cycle_state(&self) -> CycleState {
        self.cycle.state()
    }

    /// Smoothed action score from the latest frame.
    pub fn current_score(&self) -> u32 {
        self.current_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{limb_frame, squatting, standing};

    /// Feed `frame` until a rep completes, returning how many frames it took.
    fn feed_until_rep(session: &mut ExerciseSession, frame: &Frame, limit: usize) -> Option<usize> {
        (1..=limit).find(|_| session.process_frame(frame).rep_score.is_some())
    }

    #[test]
    fn test_rep_completion_with_settled_signals() {
        let mut cycle = RepCycle::new(3);
        let mut tally = ScoreTally::new();

        for score in [30, 55, 72, 72] {
            tally.observe(score);
            cycle.update(false, true);
        }
        assert_eq!(cycle.state(), CycleState::InAction);

        let mut completed = None;
        for _ in 0..4 {
            if cycle.update(true, false) == Some(CycleTransition::RepCompleted) {
                completed = Some(tally.complete_rep());
            }
        }

        assert_eq!(completed, Some(72));
        assert_eq!(tally.total_accumulated(), 72);
        assert_eq!(tally.rep_count(), 1);
        assert_eq!(tally.average_score(), 72.0);
    }

    #[test]
    fn test_squat_rep_from_frames() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat, &DetectionConfig::default());

        // 115.2° knee angle scores 72
        let deep = squatting(115.2);
        for _ in 0..4 {
            session.process_frame(&deep);
        }
        assert_eq!(session.cycle_state(), CycleState::InAction);
        assert_eq!(session.tally().current_peak(), 72);

        assert!(feed_until_rep(&mut session, &standing(), 10).is_some());
        assert_eq!(session.cycle_state(), CycleState::AtRest);
        assert_eq!(session.tally().rep_count(), 1);
        assert_eq!(session.tally().total_accumulated(), 72);
        assert_eq!(session.tally().average_score(), 72.0);
    }

    #[test]
    fn test_single_frame_flicker_is_ignored() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat, &DetectionConfig::default());
        for _ in 0..10 {
            session.process_frame(&standing());
        }
        session.process_frame(&squatting(90.0));
        for _ in 0..10 {
            session.process_frame(&standing());
        }
        assert_eq!(session.cycle_state(), CycleState::AtRest);
        assert_eq!(session.tally().rep_count(), 0);
    }

    #[test]
    fn test_occluded_frames_are_degraded() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat, &DetectionConfig::default());
        let outcome = session.process_frame(&limb_frame(90.0, 180.0, 0.1));
        assert!(outcome.degraded);
        assert!(!outcome.action.detected);
        assert_eq!(outcome.action.score, 0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat, &DetectionConfig::default());
        for _ in 0..5 {
            session.process_frame(&squatting(90.0));
        }
        session.reset();
        assert_eq!(session.cycle_state(), CycleState::AtRest);
        assert_eq!(*session.tally(), ScoreTally::default());
        assert_eq!(session.current_score(), 0);
    }
}
