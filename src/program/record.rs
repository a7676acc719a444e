//! Immutable summaries emitted at set and exercise boundaries.

use crate::core::tally::average;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a record summarises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Set,
    Exercise,
}

/// Snapshot handed to the persistence collaborator.
///
/// Fields are private; a record cannot change once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    exercise_id: u32,
    set_number: u32,
    rep_count: u32,
    duration_seconds: u32,
    total_score: u32,
    average_score: f64,
    kind: RecordKind,
    timestamp: DateTime<Utc>,
}

impl Record {
    pub(crate) fn new(
        kind: RecordKind,
        exercise_id: u32,
        set_number: u32,
        totals: SetTotals,
    ) -> Self {
        Self {
            exercise_id,
            set_number,
            rep_count: totals.reps,
            duration_seconds: totals.duration,
            total_score: totals.score,
            average_score: average(totals.score, totals.reps),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Catalog exercise id.
    pub fn exercise_id(&self) -> u32 {
        self.exercise_id
    }

    /// One-based set number.
    pub fn set_number(&self) -> u32 {
        self.set_number
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn average_score(&self) -> f64 {
        self.average_score
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// When the record was built.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Reps, seconds and score summed over one or more sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct SetTotals {
    pub reps: u32,
    pub duration: u32,
    pub score: u32,
}

impl SetTotals {
    /// Accumulate another set.
    pub fn add(&mut self, other: SetTotals) {
        self.reps += other.reps;
        self.duration += other.duration;
        self.score += other.score;
    }
}
