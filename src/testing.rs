//! Synthetic keypoint frames for unit tests.

use crate::pose::{Frame, Keypoint};

/// Place a three-joint chain whose middle joint bends by `degrees`.
fn chain(names: [&str; 3], vertex: (f64, f64), degrees: f64, score: f64) -> [Keypoint; 3] {
    let theta = degrees.to_radians();
    [
        Keypoint::new(names[0], vertex.0, vertex.1 - 1.0, score),
        Keypoint::new(names[1], vertex.0, vertex.1, score),
        Keypoint::new(
            names[2],
            vertex.0 + theta.sin(),
            vertex.1 - theta.cos(),
            score,
        ),
    ]
}

/// A full-body frame with both knees at `leg_angle` and both elbows at
/// `arm_angle`.
pub(crate) fn limb_frame(leg_angle: f64, arm_angle: f64, score: f64) -> Frame {
    let mut keypoints = Vec::with_capacity(12);
    keypoints.extend(chain(
        ["left_hip", "left_knee", "left_ankle"],
        (-1.0, 0.0),
        leg_angle,
        score,
    ));
    keypoints.extend(chain(
        ["right_hip", "right_knee", "right_ankle"],
        (1.0, 0.0),
        leg_angle,
        score,
    ));
    keypoints.extend(chain(
        ["left_shoulder", "left_elbow", "left_wrist"],
        (-1.0, -3.0),
        arm_angle,
        score,
    ));
    keypoints.extend(chain(
        ["right_shoulder", "right_elbow", "right_wrist"],
        (1.0, -3.0),
        arm_angle,
        score,
    ));
    Frame::new(keypoints)
}

/// Standing upright with straight arms.
pub(crate) fn standing() -> Frame {
    limb_frame(180.0, 180.0, 0.9)
}

/// Knees bent to the given angle.
pub(crate) fn squatting(leg_angle: f64) -> Frame {
    limb_frame(leg_angle, 180.0, 0.9)
}
