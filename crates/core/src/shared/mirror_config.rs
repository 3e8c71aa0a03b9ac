use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::infrastructure::retrying_face_analyzer::RetryPolicy;
use crate::detection::domain::detection_gate::GatePolicy;
use crate::detection::domain::effect_definition::{DetectionMode, EffectDefinition};
use crate::shared::constants::{
    DEFAULT_ANALYSIS_MAX_ATTEMPTS, DEFAULT_ANALYSIS_TIMEOUT_SECS, DEFAULT_DETECTION_INTERVAL_MS,
    DEFAULT_FACE_API_ENDPOINT, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_BACKOFF_MS, DEFAULT_PHOTO_NAME, FACE_API_ENDPOINT_ENV, FACE_API_KEY_ENV,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not determine a pictures directory")]
    NoPicturesDir,
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub photo_name: String,
    pub pictures_dir: Option<PathBuf>,
    pub detection_interval_ms: u64,
    pub detection_mode: DetectionMode,
    pub gate_policy: GatePolicy,
    pub jpeg_quality: u8,
    pub analysis: AnalysisConfig,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            photo_name: DEFAULT_PHOTO_NAME.to_string(),
            pictures_dir: None,
            detection_interval_ms: DEFAULT_DETECTION_INTERVAL_MS,
            detection_mode: DetectionMode::default(),
            gate_policy: GatePolicy::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Remote face analysis settings. The key is only ever taken from the
/// environment and is never written back to disk.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_FACE_API_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_ANALYSIS_TIMEOUT_SECS,
            max_attempts: DEFAULT_ANALYSIS_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            api_key: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MirrorConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("PersonalMirror").join("config.json"))
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Applies the process environment (API key, endpoint override).
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(FACE_API_KEY_ENV) {
            self.analysis.api_key = Some(key.trim().to_string());
        }
        if let Some(endpoint) = non_empty(FACE_API_ENDPOINT_ENV) {
            self.analysis.endpoint = endpoint.trim().to_string();
        }
        self
    }

    /// Configured directory, else the platform pictures folder, else
    /// `~/Pictures`.
    pub fn resolve_pictures_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.pictures_dir {
            return Ok(dir.clone());
        }
        dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
            .ok_or(ConfigError::NoPicturesDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = Path::new(&self.photo_name);
        if self.photo_name.trim().is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(ConfigError::Invalid {
                field: "photo_name",
                reason: format!("{:?} is not a plain file name", self.photo_name),
            });
        }
        if self.detection_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "detection_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "jpeg_quality",
                reason: format!("{} is outside 1-100", self.jpeg_quality),
            });
        }
        if self.analysis.enabled && self.analysis.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "analysis.timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn effect_definition(&self) -> EffectDefinition {
        EffectDefinition {
            mode: self.detection_mode,
            desired_interval: Duration::from_millis(self.detection_interval_ms),
            ..EffectDefinition::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.analysis.max_attempts,
            initial_backoff: Duration::from_millis(self.analysis.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.analysis.max_backoff_ms),
        }
    }

    /// Analysis runs only when enabled and a key is available.
    pub fn analysis_enabled(&self) -> bool {
        self.analysis.enabled && self.analysis.api_key.is_some()
    }
}
