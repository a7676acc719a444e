//! Core counting pipeline.
//!
//! This module contains:
//! - Joint angle geometry
//! - Per-frame exercise pose classifiers
//! - Rolling-window smoothing of classifier output
//! - The debounced rep cycle and score tally
//! - `ExerciseSession`, which wires them together for one exercise

pub mod classifier;
pub mod cycle;
pub mod geometry;
pub mod session;
pub mod smoother;
pub mod tally;

// Re-export commonly used types
pub use classifier::{
    depth_score, Classifier, ClassifierResult, DepthClassifier, ExerciseKind, ExercisePoses,
    LimbChain, StraightLimbClassifier,
};
pub use cycle::{CycleState, CycleTransition, RepCycle};
pub use geometry::angle;
pub use session::{ExerciseSession, FrameOutcome};
pub use smoother::{SmoothedResult, Smoother};
pub use tally::ScoreTally;
