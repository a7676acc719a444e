//! Program progression: steps, sets, rest breaks and records.
//!
//! ```text
//!   ┌────────────┐  limit reached   ┌─────────┐
//!   │ Exercising │ ───────────────▶ │  Break  │
//!   └────────────┘   (Record out)   └─────────┘
//!         ▲                              │ break_duration ticks
//!         ├──── more sets ───────────────┤
//!         ├──── next step (order + 1) ───┤
//!         │                              └──── no next step ──▶ Completed
//! ```
//!
//! Frames and one-second ticks are the only inputs. Events accumulate and
//! are drained with [`ProgramEngine::take_events`].

use crate::config::DetectionConfig;
use crate::core::classifier::ExerciseKind;
use crate::core::session::ExerciseSession;
use crate::core::tally::ScoreTally;
use crate::pose::Frame;
use crate::program::catalog::{ProgramCatalog, ProgramStep, StepMode};
use crate::program::live::{LiveCounters, ProgramPhase};
use crate::program::record::{Record, RecordKind, SetTotals};
use crate::stats::SharedSessionStats;
use thiserror::Error;
use uuid::Uuid;

/// Something the outside world may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramEvent {
    StepStarted {
        order_num: u32,
        exercise: ExerciseKind,
    },
    SetStarted {
        order_num: u32,
        set_number: u32,
    },
    RepCompleted {
        rep_count: u32,
        score: u32,
    },
    Record(Record),
    BreakStarted {
        duration: u32,
    },
    /// All steps are exhausted
    Completed,
    /// Torn down before completion
    Stopped,
}

/// Reasons a program cannot start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("No program configured")]
    NoProgramConfigured,
    #[error("Step {order_num} uses exercise {exercise_id}, which has no pose classifiers")]
    UnmappedExercise { order_num: u32, exercise_id: u32 },
}

/// Live instance of a program step.
#[derive(Debug, Clone)]
pub struct ExerciseRuntime {
    step: ProgramStep,
    sets_completed: u32,
    elapsed: u32,
    session: ExerciseSession,
    /// Sums over the sets already finished
    finished: SetTotals,
}

impl ExerciseRuntime {
    fn new(step: ProgramStep, kind: ExerciseKind, config: &DetectionConfig) -> Self {
        Self {
            step,
            sets_completed: 0,
            elapsed: 0,
            session: ExerciseSession::new(kind, config),
            finished: SetTotals::default(),
        }
    }

    /// The catalog step being run.
    pub fn step(&self) -> &ProgramStep {
        &self.step
    }

    pub fn kind(&self) -> ExerciseKind {
        self.session.kind()
    }

    /// Sets finished so far.
    pub fn sets_completed(&self) -> u32 {
        self.sets_completed
    }

    /// Seconds into the current set.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn tally(&self) -> &ScoreTally {
        self.session.tally()
    }

    pub fn session(&self) -> &ExerciseSession {
        &self.session
    }

    fn set_number(&self) -> u32 {
        self.sets_completed + 1
    }

    fn is_last_set(&self) -> bool {
        self.set_number() >= self.step.sets()
    }

    /// Limit check; the step's mode decides which limit applies.
    fn set_complete(&self) -> bool {
        match self.step.mode {
            StepMode::Counter => self
                .step
                .rep_limit
                .is_some_and(|limit| self.tally().rep_count() >= limit),
            StepMode::Timer => self
                .step
                .duration_limit
                .is_some_and(|limit| self.elapsed >= limit),
        }
    }

    fn current_totals(&self) -> SetTotals {
        SetTotals {
            reps: self.tally().rep_count(),
            duration: self.elapsed,
            score: self.tally().total_accumulated(),
        }
    }

    fn start_next_set(&mut self) {
        self.sets_completed += 1;
        self.elapsed = 0;
        self.session.reset();
    }
}

/// Drives a catalog of steps through sets and breaks.
pub struct ProgramEngine {
    catalog: ProgramCatalog,
    config: DetectionConfig,
    runtime: Option<ExerciseRuntime>,
    phase: ProgramPhase,
    ticks: u32,
    tick_ceiling: Option<u32>,
    finished: bool,
    run_id: Uuid,
    events: Vec<ProgramEvent>,
    stats: Option<SharedSessionStats>,
}

impl ProgramEngine {
    /// Validate the catalog and activate the step with order number 1.
    pub fn start(catalog: ProgramCatalog, config: DetectionConfig) -> Result<Self, ProgramError> {
        for step in catalog.steps() {
            if ExerciseKind::from_id(step.exercise_id).is_none() {
                return Err(ProgramError::UnmappedExercise {
                    order_num: step.order_num,
                    exercise_id: step.exercise_id,
                });
            }
        }

        let first = catalog
            .by_order(1)
            .cloned()
            .ok_or(ProgramError::NoProgramConfigured)?;

        let mut engine = Self {
            catalog,
            config,
            runtime: None,
            phase: ProgramPhase::Exercising,
            ticks: 0,
            tick_ceiling: None,
            finished: false,
            run_id: Uuid::new_v4(),
            events: Vec::new(),
            stats: None,
        };
        engine.activate(first);

        tracing::info!(run_id = %engine.run_id, steps = engine.catalog.steps().len(), "program started");
        Ok(engine)
    }

    /// Count into shared session statistics.
    pub fn with_stats(mut self, stats: SharedSessionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Feed one pose frame. Ignored during breaks and after the program ends.
    pub fn process_frame(&mut self, frame: &Frame) {
        if self.finished || self.phase == ProgramPhase::Break {
            return;
        }
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        let outcome = runtime.session.process_frame(frame);
        if let Some(stats) = &self.stats {
            stats.record_frame();
            if outcome.degraded {
                stats.record_degraded_frame();
            }
        }

        let Some(score) = outcome.rep_score else {
            return;
        };

        self.events.push(ProgramEvent::RepCompleted {
            rep_count: runtime.tally().rep_count(),
            score,
        });
        if let Some(stats) = &self.stats {
            stats.record_rep();
        }

        if runtime.set_complete() {
            self.finish_set();
        }
    }

    /// Advance the one-second clock.
    pub fn tick(&mut self) {
        if self.finished {
            return;
        }
        self.ticks += 1;

        match self.phase {
            ProgramPhase::Exercising => {
                let ticks = self.ticks;
                let complete = self.runtime.as_mut().is_some_and(|runtime| {
                    runtime.elapsed = ticks;
                    runtime.set_complete()
                });
                if complete {
                    self.finish_set();
                }
            }
            ProgramPhase::Break => {
                if self.tick_ceiling.is_some_and(|ceiling| self.ticks >= ceiling) {
                    self.end_break();
                }
            }
        }
    }

    /// Tear the program down.
    ///
    /// With `flush`, a set in progress that has any reps or elapsed time is
    /// emitted as a `Set` record first.
    pub fn stop(&mut self, flush: bool) {
        if self.finished {
            return;
        }

        if flush && self.phase == ProgramPhase::Exercising {
            if let Some(runtime) = &self.runtime {
                let totals = runtime.current_totals();
                if totals.reps > 0 || totals.duration > 0 {
                    let record = Record::new(
                        RecordKind::Set,
                        runtime.step.exercise_id,
                        runtime.set_number(),
                        totals,
                    );
                    self.emit_record(record);
                }
            }
        }

        self.finished = true;
        self.runtime = None;
        self.events.push(ProgramEvent::Stopped);
        tracing::info!(run_id = %self.run_id, flush, "program stopped");
    }

    /// Drain accumulated events.
    pub fn take_events(&mut self) -> Vec<ProgramEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether events are waiting to be drained.
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn phase(&self) -> ProgramPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The active step, if the program is still running.
    pub fn runtime(&self) -> Option<&ExerciseRuntime> {
        self.runtime.as_ref()
    }

    /// Identifier of this program run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Display projection of the current state.
    pub fn live(&self) -> LiveCounters {
        let mut live = LiveCounters {
            phase: self.phase,
            finished: self.finished,
            ..Default::default()
        };

        let Some(runtime) = &self.runtime else {
            return live;
        };

        let tally = runtime.tally();
        live.exercise = Some(runtime.kind());
        live.order_num = runtime.step.order_num;
        live.set_number = runtime.set_number();
        live.sets_planned = runtime.step.sets();
        live.rep_count = tally.rep_count();
        live.current_score = runtime.session.current_score();
        live.current_peak = tally.current_peak();
        live.average_score = tally.average_score();

        match self.phase {
            ProgramPhase::Exercising => {
                live.elapsed = runtime.elapsed;
                live.remaining = match runtime.step.mode {
                    StepMode::Timer => runtime
                        .step
                        .duration_limit
                        .map(|limit| limit.saturating_sub(runtime.elapsed)),
                    StepMode::Counter => None,
                };
            }
            ProgramPhase::Break => {
                live.elapsed = self.ticks;
                live.remaining = self
                    .tick_ceiling
                    .map(|ceiling| ceiling.saturating_sub(self.ticks));
            }
        }
        live
    }

    fn activate(&mut self, step: ProgramStep) {
        // Validated in `start`
        let Some(kind) = ExerciseKind::from_id(step.exercise_id) else {
            return;
        };

        let order_num = step.order_num;
        tracing::info!(order_num, exercise = %kind, sets = step.sets(), "step started");

        self.runtime = Some(ExerciseRuntime::new(step, kind, &self.config));
        self.phase = ProgramPhase::Exercising;
        self.ticks = 0;
        self.tick_ceiling = None;
        self.events.push(ProgramEvent::StepStarted {
            order_num,
            exercise: kind,
        });
        self.events.push(ProgramEvent::SetStarted {
            order_num,
            set_number: 1,
        });
    }

    /// The current set hit its limit: emit its record and start the break.
    fn finish_set(&mut self) {
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        runtime.elapsed = self.ticks;
        let set_totals = runtime.current_totals();
        let exercise_id = runtime.step.exercise_id;
        let set_number = runtime.set_number();

        let record = if runtime.is_last_set() {
            let mut totals = runtime.finished;
            totals.add(set_totals);
            Record::new(RecordKind::Exercise, exercise_id, set_number, totals)
        } else {
            Record::new(RecordKind::Set, exercise_id, set_number, set_totals)
        };
        runtime.finished.add(set_totals);

        let break_duration = runtime.step.break_duration;
        tracing::info!(
            exercise_id,
            set_number,
            reps = set_totals.reps,
            seconds = set_totals.duration,
            "set finished"
        );

        self.emit_record(record);
        self.phase = ProgramPhase::Break;
        self.ticks = 0;
        self.tick_ceiling = Some(break_duration);
        self.events.push(ProgramEvent::BreakStarted {
            duration: break_duration,
        });

        if break_duration == 0 {
            self.end_break();
        }
    }

    fn end_break(&mut self) {
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        if !runtime.is_last_set() {
            runtime.start_next_set();
            let order_num = runtime.step.order_num;
            let set_number = runtime.set_number();

            self.phase = ProgramPhase::Exercising;
            self.ticks = 0;
            self.tick_ceiling = None;
            self.events.push(ProgramEvent::SetStarted {
                order_num,
                set_number,
            });
            tracing::info!(order_num, set_number, "set started");
            return;
        }

        let next_order = runtime.step.order_num + 1;
        match self.catalog.by_order(next_order).cloned() {
            Some(step) => self.activate(step),
            None => self.complete(),
        }
    }

    fn complete(&mut self) {
        self.finished = true;
        self.runtime = None;
        self.tick_ceiling = None;
        self.events.push(ProgramEvent::Completed);
        if let Some(stats) = &self.stats {
            stats.record_program_completed();
        }
        tracing::info!(run_id = %self.run_id, "program completed");
    }

    fn emit_record(&mut self, record: Record) {
        if let Some(stats) = &self.stats {
            stats.record_emitted();
        }
        self.events.push(ProgramEvent::Record(record));
    }
}
