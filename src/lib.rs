//! Smart Counter - pose-driven repetition counting for workout programs.
//!
//! Frames of body keypoints from a pose estimator are classified into an
//! exercise's starting posture and its action pose. The classifier output
//! is smoothed, and a debounced cycle counts one rep per full
//! rest → action → rest movement. A program engine runs ordered steps of
//! sets and rest breaks, emitting a [`Record`] as each set finishes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Smart Counter                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │   Frame    │──▶│ Classifier │──▶│  Smoother  │            │
//! │  │ (keypoints)│   │  (angles)  │   │ (window 5) │            │
//! │  └────────────┘   └────────────┘   └────────────┘            │
//! │                                          │                   │
//! │                                          ▼                   │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │   Record   │◀──│  Program   │◀──│ Rep Cycle  │            │
//! │  │ (set/exer) │   │   Engine   │   │ + Tally    │            │
//! │  └────────────┘   └────────────┘   └────────────┘            │
//! │                         ▲                                    │
//! │                    1 s Tick                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use smart_counter::{DetectionConfig, ProgramCatalog, ProgramEngine, ProgramStep};
//!
//! // Two sets of ten squats with a 30 second rest
//! let catalog = ProgramCatalog::new(vec![ProgramStep::counter(1, 2, 10, 2, 30)]);
//! let mut engine = ProgramEngine::start(catalog, DetectionConfig::default())
//!     .expect("program has a first step");
//!
//! // Feed frames with engine.process_frame(&frame) and call engine.tick()
//! // once per second, then drain engine.take_events().
//! ```

pub mod config;
pub mod core;
pub mod pose;
pub mod program;
pub mod stats;

#[cfg(feature = "gateway")]
pub mod gateway;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, DetectionConfig};
pub use core::{ExerciseKind, ExerciseSession};
pub use pose::{Frame, Keypoint};
pub use program::{
    DriverInput, LiveCounters, ProgramCatalog, ProgramDriver, ProgramEngine, ProgramError,
    ProgramEvent, ProgramPhase, ProgramStep, Record, RecordKind, Ticker,
};
pub use stats::{SessionStats, SharedSessionStats, StatsSnapshot};

// Gateway re-exports (when enabled)
#[cfg(feature = "gateway")]
pub use gateway::{
    BlockingGatewayClient, GatewayClient, GatewayConfig, GatewayError, GatewayResponse,
    RecordBatch,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
