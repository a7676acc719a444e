//! Pose input: keypoint frames and the sources that deliver them.

pub mod replay;
pub mod types;

pub use replay::{
    load, read_frames, schedule, FrameReader, ReplayError, ReplayStep, DEFAULT_FPS,
    MAX_TICK_GAP_SECS,
};
pub use types::{Frame, Joint, Keypoint, Point};
