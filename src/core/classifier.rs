//! Per-frame exercise pose classifiers.
//!
//! Each exercise is a pair of classifiers: an initial pose the user returns
//! to between reps, and an action pose that marks the working phase.
//! Classifiers are stateless; temporal filtering lives in the smoother.

use crate::config::DetectionConfig;
use crate::core::geometry::angle;
use crate::pose::{Frame, Joint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Angle treated as a fully extended limb (score 0).
pub const FULLY_EXTENDED_ANGLE: f64 = 180.0;

/// Angle treated as the target depth (score 100).
pub const FULLY_BENT_ANGLE: f64 = 90.0;

/// Below this angle the limb is over-bent and the score is penalised.
pub const OVERBEND_ANGLE: f64 = 80.0;

/// Score points removed per degree past `OVERBEND_ANGLE`.
pub const OVERBEND_PENALTY: f64 = 1.5;

/// Raw per-frame classifier output.
///
/// Posture classifiers only decide `detected`; their score is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub detected: bool,
    /// Pose depth score in [0, 100]
    pub score: f64,
}

impl ClassifierResult {
    /// Result reported when required keypoints are missing or unreliable.
    pub const MISSED: Self = Self {
        detected: false,
        score: 0.0,
    };

    /// Posture-only result: full score when detected.
    pub fn posture(detected: bool) -> Self {
        Self {
            detected,
            score: 0.0,
        }
    }
}

/// Left and right three-joint chains whose middle joint is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimbChain {
    pub left: [Joint; 3],
    pub right: [Joint; 3],
}

impl LimbChain {
    /// Hip-knee-ankle on both sides.
    pub const LEGS: Self = Self {
        left: [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle],
        right: [Joint::RightHip, Joint::RightKnee, Joint::RightAnkle],
    };

    /// Shoulder-elbow-wrist on both sides.
    pub const ARMS: Self = Self {
        left: [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist],
        right: [Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist],
    };

    /// All six joints this chain requires.
    pub fn joints(&self) -> impl Iterator<Item = Joint> + '_ {
        self.left.iter().chain(self.right.iter()).copied()
    }

    /// Left and right joint angles, or `None` if any joint is missing or
    /// below `threshold`.
    pub fn angles(&self, frame: &Frame, threshold: f64) -> Option<(f64, f64)> {
        let left = chain_angle(frame, self.left, threshold)?;
        let right = chain_angle(frame, self.right, threshold)?;
        Some((left, right))
    }

    /// Whether every joint of the chain is usable in this frame.
    pub fn is_visible(&self, frame: &Frame, threshold: f64) -> bool {
        self.joints()
            .all(|joint| frame.confident(joint, threshold).is_some())
    }
}

fn chain_angle(frame: &Frame, chain: [Joint; 3], threshold: f64) -> Option<f64> {
    let a = frame.confident(chain[0], threshold)?;
    let b = frame.confident(chain[1], threshold)?;
    let c = frame.confident(chain[2], threshold)?;
    Some(angle(a, b, c))
}

/// Map a joint angle to a 0-100 depth score.
///
/// 180° maps to 0 and 90° to 100, linearly, then clamped. Bending past 80°
/// subtracts `(80 - angle) * 1.5`.
pub fn depth_score(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }

    let mut pct = ((FULLY_EXTENDED_ANGLE - angle) / (FULLY_EXTENDED_ANGLE - FULLY_BENT_ANGLE)
        * 100.0)
        .clamp(0.0, 100.0);

    if angle < OVERBEND_ANGLE {
        pct -= (OVERBEND_ANGLE - angle) * OVERBEND_PENALTY;
    }

    pct.clamp(0.0, 100.0)
}

/// Scores how deeply both limbs of a chain are bent.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthClassifier {
    pub limbs: LimbChain,
    pub confidence_threshold: f64,
    /// Minimum score that counts as the pose being held
    pub detect_score: f64,
}

impl DepthClassifier {
    /// Create a depth classifier over a limb pair.
    pub fn new(limbs: LimbChain, confidence_threshold: f64, detect_score: f64) -> Self {
        Self {
            limbs,
            confidence_threshold,
            detect_score,
        }
    }

    /// Score the mean bend of both limbs.
    pub fn classify(&self, frame: &Frame) -> ClassifierResult {
        let Some((left, right)) = self.limbs.angles(frame, self.confidence_threshold) else {
            return ClassifierResult::MISSED;
        };

        let score = depth_score((left + right) / 2.0);
        ClassifierResult {
            detected: score >= self.detect_score,
            score,
        }
    }
}

/// Detects an upright posture: both limbs at least `straight_angle`.
#[derive(Debug, Clone, PartialEq)]
pub struct StraightLimbClassifier {
    pub limbs: LimbChain,
    pub confidence_threshold: f64,
    pub straight_angle: f64,
}

impl StraightLimbClassifier {
    /// Create a posture classifier over a limb pair.
    pub fn new(limbs: LimbChain, confidence_threshold: f64, straight_angle: f64) -> Self {
        Self {
            limbs,
            confidence_threshold,
            straight_angle,
        }
    }

    /// Check both limbs against the straight angle.
    pub fn classify(&self, frame: &Frame) -> ClassifierResult {
        match self.limbs.angles(frame, self.confidence_threshold) {
            Some((left, right)) => ClassifierResult::posture(
                left >= self.straight_angle && right >= self.straight_angle,
            ),
            None => ClassifierResult::MISSED,
        }
    }
}

/// The closed set of classifier implementations.
#[derive(Debug, Clone, PartialEq)]
pub enum Classifier {
    Depth(DepthClassifier),
    Straight(StraightLimbClassifier),
}

impl Classifier {
    /// Classify a single frame.
    pub fn classify(&self, frame: &Frame) -> ClassifierResult {
        match self {
            Classifier::Depth(c) => c.classify(frame),
            Classifier::Straight(c) => c.classify(frame),
        }
    }

    /// True when the frame lacks a keypoint this classifier needs.
    pub fn is_degraded(&self, frame: &Frame) -> bool {
        let (limbs, threshold) = match self {
            Classifier::Depth(c) => (&c.limbs, c.confidence_threshold),
            Classifier::Straight(c) => (&c.limbs, c.confidence_threshold),
        };
        !limbs.is_visible(frame, threshold)
    }
}

/// Initial/action classifier pair for one exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePoses {
    pub initial: Classifier,
    pub action: Classifier,
}

/// Exercises the counter can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    PushUp,
    Squat,
}

impl ExerciseKind {
    /// Resolve a catalog exercise id.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(ExerciseKind::PushUp),
            2 => Some(ExerciseKind::Squat),
            _ => None,
        }
    }

    /// Catalog exercise id.
    pub fn id(&self) -> u32 {
        match self {
            ExerciseKind::PushUp => 1,
            ExerciseKind::Squat => 2,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            ExerciseKind::PushUp => "push-up",
            ExerciseKind::Squat => "squat",
        }
    }

    /// Build the classifier pair for this exercise.
    pub fn poses(&self, config: &DetectionConfig) -> ExercisePoses {
        match self {
            ExerciseKind::PushUp => ExercisePoses {
                initial: Classifier::Straight(StraightLimbClassifier::new(
                    LimbChain::ARMS,
                    config.posture_confidence,
                    config.straight_arm_angle,
                )),
                action: Classifier::Depth(DepthClassifier::new(
                    LimbChain::ARMS,
                    config.depth_confidence,
                    config.detect_score,
                )),
            },
            ExerciseKind::Squat => ExercisePoses {
                initial: Classifier::Straight(StraightLimbClassifier::new(
                    LimbChain::LEGS,
                    config.posture_confidence,
                    config.straight_leg_angle,
                )),
                action: Classifier::Depth(DepthClassifier::new(
                    LimbChain::LEGS,
                    config.depth_confidence,
                    config.detect_score,
                )),
            },
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
