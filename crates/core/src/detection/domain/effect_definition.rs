use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::DEFAULT_DETECTION_INTERVAL_MS;

/// Speed/accuracy trade-off requested from the detection effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    #[default]
    HighPerformance,
    Balanced,
    HighQuality,
}

/// Settings for the face detection stage attached to the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDefinition {
    pub mode: DetectionMode,
    /// When false, detection never delays incoming samples.
    pub synchronous: bool,
    pub desired_interval: Duration,
}

impl Default for EffectDefinition {
    fn default() -> Self {
        Self {
            mode: DetectionMode::HighPerformance,
            synchronous: false,
            desired_interval: Duration::from_millis(DEFAULT_DETECTION_INTERVAL_MS),
        }
    }
}
