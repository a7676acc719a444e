//! Workout programs: catalog, progression engine and emitted records.
//!
//! A program is an ordered list of steps. Each step runs its sets through
//! an [`ExerciseSession`](crate::core::ExerciseSession), rests between them,
//! and emits a [`Record`] whenever a set finishes.

pub mod catalog;
pub mod driver;
pub mod engine;
pub mod live;
pub mod record;

pub use catalog::{parse_hms, CatalogEntry, CatalogError, ProgramCatalog, ProgramStep, StepMode};
pub use driver::{DriverInput, ProgramDriver, Ticker};
pub use engine::{ExerciseRuntime, ProgramEngine, ProgramError, ProgramEvent};
pub use live::{format_clock, LiveCounters, ProgramPhase};
pub use record::{Record, RecordKind};
