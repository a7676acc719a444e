//! Keypoint and frame types delivered by an upstream pose estimator.
//!
//! The shape matches what single-pose estimators such as MoveNet emit:
//! a list of named keypoints with a position and a confidence score.

use serde::{Deserialize, Serialize};

/// A 2-D position in image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Body joints the classifiers know how to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// Keypoint name as reported by the estimator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// A single named keypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Joint name (e.g. "left_hip")
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Detection confidence in [0, 1]
    #[serde(alias = "confidence")]
    pub score: f64,
}

impl Keypoint {
    /// Create a keypoint.
    pub fn new(name: impl Into<String>, x: f64, y: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score,
        }
    }

    /// Position in image space.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One instant's set of keypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub keypoints: Vec<Keypoint>,
    /// Capture time in milliseconds, when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

impl Frame {
    /// Create an untimed frame.
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            timestamp_ms: None,
        }
    }

    /// Attach a capture time.
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Look up a keypoint by joint.
    pub fn keypoint(&self, joint: Joint) -> Option<&Keypoint> {
        let name = joint.name();
        self.keypoints.iter().find(|k| k.name == name)
    }

    /// Position of a joint if it is present, confident and finite.
    pub fn confident(&self, joint: Joint, threshold: f64) -> Option<Point> {
        self.keypoint(joint)
            .filter(|k| k.score >= threshold)
            .map(Keypoint::position)
            .filter(Point::is_finite)
    }
}
