//! Workout program catalog.
//!
//! The storage backend hands out program rows with limits encoded as
//! `HH:MM:SS` strings; these are converted into typed `ProgramStep`s.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// How a set is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// The set ends after `rep_limit` reps
    Counter,
    /// The set ends after `duration_limit` seconds
    Timer,
}

impl StepMode {
    /// Decode a backend `type_id`.
    pub fn from_type_id(type_id: u32) -> Option<Self> {
        match type_id {
            1 => Some(StepMode::Counter),
            2 => Some(StepMode::Timer),
            _ => None,
        }
    }
}

/// One exercise entry of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramStep {
    pub exercise_id: u32,
    pub mode: StepMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_limit: Option<u32>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_limit: Option<u32>,
    /// Seconds of rest after each set
    #[serde(default)]
    pub break_duration: u32,
    pub sets_planned: u32,
    pub order_num: u32,
}

impl ProgramStep {
    /// A rep-bounded step.
    pub fn counter(order_num: u32, exercise_id: u32, rep_limit: u32, sets: u32, rest: u32) -> Self {
        Self {
            exercise_id,
            mode: StepMode::Counter,
            rep_limit: Some(rep_limit),
            duration_limit: None,
            break_duration: rest,
            sets_planned: sets,
            order_num,
        }
    }

    /// A time-bounded step.
    pub fn timer(order_num: u32, exercise_id: u32, seconds: u32, sets: u32, rest: u32) -> Self {
        Self {
            exercise_id,
            mode: StepMode::Timer,
            rep_limit: None,
            duration_limit: Some(seconds),
            break_duration: rest,
            sets_planned: sets,
            order_num,
        }
    }

    /// Planned sets, never less than one.
    pub fn sets(&self) -> u32 {
        self.sets_planned.max(1)
    }
}

/// Catalog row as served by the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub exercise_id: u32,
    #[serde(default)]
    pub exercise_name: Option<String>,
    #[serde(default)]
    pub max_reps: Option<u32>,
    /// `HH:MM:SS`
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub sets_count: Option<u32>,
    pub type_id: u32,
    pub order_num: u32,
    /// `HH:MM:SS`
    #[serde(default)]
    pub break_time: Option<String>,
}

impl TryFrom<CatalogEntry> for ProgramStep {
    type Error = CatalogError;

    fn try_from(entry: CatalogEntry) -> Result<Self, Self::Error> {
        let mode = StepMode::from_type_id(entry.type_id).ok_or(CatalogError::UnknownType {
            order_num: entry.order_num,
            type_id: entry.type_id,
        })?;

        Ok(Self {
            exercise_id: entry.exercise_id,
            mode,
            rep_limit: entry.max_reps,
            duration_limit: parse_optional_hms(entry.duration.as_deref())?,
            break_duration: parse_optional_hms(entry.break_time.as_deref())?.unwrap_or(0),
            sets_planned: entry.sets_count.unwrap_or(1).max(1),
            order_num: entry.order_num,
        })
    }
}

/// Parse an `HH:MM:SS` string into seconds.
pub fn parse_hms(value: &str) -> Result<u32, CatalogError> {
    let invalid = || CatalogError::InvalidTime(value.to_string());

    let parts: Vec<u32> = value
        .trim()
        .split(':')
        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;

    match parts.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => h
            .checked_mul(3600)
            .and_then(|secs| secs.checked_add(m * 60 + s))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_optional_hms(value: Option<&str>) -> Result<Option<u32>, CatalogError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_hms(v).map(Some),
    }
}

/// Ordered list of program steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCatalog {
    steps: Vec<ProgramStep>,
}

impl ProgramCatalog {
    /// Create a catalog, ordering steps by `order_num`.
    pub fn new(mut steps: Vec<ProgramStep>) -> Self {
        steps.sort_by_key(|s| s.order_num);
        Self { steps }
    }

    /// Build from backend rows.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let steps = entries
            .into_iter()
            .map(ProgramStep::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(steps))
    }

    /// Parse a JSON array of backend rows.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Read a JSON catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CatalogError::Io(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Steps in program order.
    pub fn steps(&self) -> &[ProgramStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step with the given order number.
    pub fn by_order(&self, order_num: u32) -> Option<&ProgramStep> {
        self.steps.iter().find(|s| s.order_num == order_num)
    }
}

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid time '{0}', expected HH:MM:SS")]
    InvalidTime(String),
    #[error("Step {order_num} has unknown type id {type_id}")]
    UnknownType { order_num: u32, type_id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hms() {
        assert_eq!(parse_hms("00:00:30").unwrap(), 30);
        assert_eq!(parse_hms("00:01:30").unwrap(), 90);
        assert_eq!(parse_hms("01:00:00").unwrap(), 3600);
        assert!(parse_hms("1:30").is_err());
        assert!(parse_hms("00:75:00").is_err());
        assert!(parse_hms("aa:bb:cc").is_err());
    }

    #[test]
    fn test_catalog_from_backend_rows() {
        let json = r#"[
            {"exercise_id": 2, "exercise_name": "Squat", "max_reps": null,
             "duration": "00:01:00", "sets_count": 2, "type_id": 2,
             "order_num": 2, "break_time": "00:00:45"},
            {"exercise_id": 1, "exercise_name": "Push-up", "max_reps": 10,
             "duration": null, "sets_count": 0, "type_id": 1,
             "order_num": 1, "break_time": "00:00:30"}
        ]"#;

        let catalog = ProgramCatalog::from_json(json).unwrap();
        let steps = catalog.steps();
        assert_eq!(steps.len(), 2);

        assert_eq!(steps[0].order_num, 1);
        assert_eq!(steps[0].mode, StepMode::Counter);
        assert_eq!(steps[0].rep_limit, Some(10));
        assert_eq!(steps[0].sets_planned, 1);
        assert_eq!(steps[0].break_duration, 30);

        let timer = catalog.by_order(2).unwrap();
        assert_eq!(timer.mode, StepMode::Timer);
        assert_eq!(timer.duration_limit, Some(60));
        assert_eq!(timer.break_duration, 45);
    }

    #[test]
    fn test_missing_break_defaults_to_zero() {
        let json = r#"[{"exercise_id": 2, "type_id": 1, "order_num": 1, "max_reps": 5, "break_time": ""}]"#;
        let catalog = ProgramCatalog::from_json(json).unwrap();
        assert_eq!(catalog.steps()[0].break_duration, 0);
        assert_eq!(catalog.steps()[0].duration_limit, None);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"[{"exercise_id": 2, "type_id": 9, "order_num": 1}]"#;
        assert!(matches!(
            ProgramCatalog::from_json(json),
            Err(CatalogError::UnknownType { type_id: 9, .. })
        ));
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let json = r#"[{"exercise_id": 2, "type_id": 2, "order_num": 1, "duration": "soon"}]"#;
        assert!(matches!(
            ProgramCatalog::from_json(json),
            Err(CatalogError::InvalidTime(_))
        ));
    }
}
