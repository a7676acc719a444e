//! JSON-lines frame sources.
//!
//! Each line holds one [`Frame`]. Recorded sessions are replayed through
//! [`schedule`], which interleaves the one-second ticks a live clock would
//! have produced; live input is read line by line with [`FrameReader`].

use crate::pose::Frame;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Frame rate assumed when frames carry no timestamps.
pub const DEFAULT_FPS: u32 = 30;

/// Longest timestamp gap, in seconds, replayed tick by tick.
pub const MAX_TICK_GAP_SECS: u64 = 3600;

/// Frame source errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No frames in {0}")]
    NoFrames(String),
}

/// One input of a replayed session.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Frame(Frame),
    Tick,
}

fn parse_line(line: &str, line_no: usize) -> Option<Frame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Frame>(line) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(line = line_no, "Skipping unparsable frame: {e}");
            None
        }
    }
}

/// Read every parsable frame from a JSON-lines source.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<Frame>, ReplayError> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        if let Some(frame) = parse_line(&line?, idx + 1) {
            frames.push(frame);
        }
    }
    Ok(frames)
}

/// Read a JSON-lines file, failing if it holds no usable frame.
pub fn load(path: &Path) -> Result<Vec<Frame>, ReplayError> {
    let frames = read_frames(BufReader::new(File::open(path)?))?;
    if frames.is_empty() {
        return Err(ReplayError::NoFrames(path.display().to_string()));
    }
    Ok(frames)
}

/// Interleave ticks with frames.
///
/// When the first frame is timestamped, a tick precedes every frame whose
/// timestamp crosses another whole second since the first one. Otherwise a
/// tick follows every `fps` frames.
///
/// A gap longer than [`MAX_TICK_GAP_SECS`] is logged and replayed as a
/// single tick.
pub fn schedule(frames: Vec<Frame>, fps: u32) -> Vec<ReplayStep> {
    let mut steps = Vec::with_capacity(frames.len() + frames.len() / 8);

    match frames.first().and_then(|f| f.timestamp_ms) {
        Some(start) => {
            let mut ticks: u64 = 0;
            for frame in frames {
                if let Some(ts) = frame.timestamp_ms {
                    let whole = ts.saturating_sub(start) / 1000;
                    if whole.saturating_sub(ticks) > MAX_TICK_GAP_SECS {
                        tracing::warn!(
                            gap_secs = whole - ticks,
                            timestamp_ms = ts,
                            "timestamp gap too large, replaying it as one tick"
                        );
                        steps.push(ReplayStep::Tick);
                        ticks = whole;
                    }
                    while ticks < whole {
                        steps.push(ReplayStep::Tick);
                        ticks += 1;
                    }
                }
                steps.push(ReplayStep::Frame(frame));
            }
        }
        None => {
            let fps = fps.max(1) as usize;
            for (idx, frame) in frames.into_iter().enumerate() {
                steps.push(ReplayStep::Frame(frame));
                if (idx + 1) % fps == 0 {
                    steps.push(ReplayStep::Tick);
                }
            }
        }
    }

    steps
}

/// Blocking iterator over frames arriving line by line.
///
/// Unparsable lines are skipped; iteration ends at end of input or on the
/// first read error.
pub struct FrameReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> FrameReader<R> {
    /// Wrap a line-oriented reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            self.line_no += 1;
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(frame) = parse_line(&line, self.line_no) {
                        return Some(frame);
                    }
                }
                Err(e) => {
                    tracing::warn!("Frame input closed: {e}");
                    return None;
                }
            }
        }
    }
}
