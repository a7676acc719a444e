//! Configuration for the smart counter.

use crate::core::cycle::DEFAULT_DEBOUNCE_FRAMES;
use crate::core::smoother::DEFAULT_WINDOW;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Classifier and filtering parameters
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Path for exporting run records
    pub export_path: PathBuf,

    /// Path for storing session statistics
    pub data_path: PathBuf,

    /// Period of the program clock
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,

    /// Emit a partial set record when a run is stopped early
    #[serde(default)]
    pub flush_on_stop: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smart-counter");

        Self {
            detection: DetectionConfig::default(),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
            tick_interval: Duration::from_secs(1),
            flush_on_stop: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(e.to_string()))?;
            let config: Config =
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smart-counter")
            .join("config.json")
    }

    /// Where session statistics persist.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Classifier thresholds and temporal filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Rolling window length in frames
    pub smoothing_window: usize,
    /// Consecutive frames required before a cycle transition
    pub debounce_frames: u32,
    /// Minimum keypoint confidence for depth classifiers
    pub depth_confidence: f64,
    /// Minimum keypoint confidence for posture classifiers
    pub posture_confidence: f64,
    /// Depth score at which the action pose counts as detected
    pub detect_score: f64,
    /// Knee angle (degrees) at or above which legs count as straight
    pub straight_leg_angle: f64,
    /// Elbow angle (degrees) at or above which arms count as straight
    pub straight_arm_angle: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_WINDOW,
            debounce_frames: DEFAULT_DEBOUNCE_FRAMES,
            depth_confidence: 0.4,
            posture_confidence: 0.3,
            detect_score: 40.0,
            straight_leg_angle: 165.0,
            straight_arm_angle: 150.0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert!(!config.flush_on_stop);
        assert_eq!(config.detection.smoothing_window, 5);
        assert_eq!(config.detection.debounce_frames, 3);
        assert!(config.stats_path().ends_with("stats.json"));
    }

    #[test]
    fn test_partial_detection_section() {
        let json = r#"{
            "detection": {"smoothing_window": 7},
            "export_path": "/tmp/exports",
            "data_path": "/tmp/data",
            "tick_interval": 0
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.smoothing_window, 7);
        assert_eq!(config.detection.straight_arm_angle, 150.0);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert!(!config.flush_on_stop);
    }
}
