//! Session configuration
//!
//! Loaded from an optional file, then overridden by environment variables
//! such as `GAZE__CAMERA__FPS=15` or `GAZE__DMS__ZONE_STRATEGY=knn`.

use std::path::Path;

use alerting::AlertConfig;
use camera_capture::CameraConfig;
use config::{Config, Environment, File};
use dms::DmsConfig;
use engagement::EngagementConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::SessionError;

/// Complete monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub camera: CameraConfig,
    pub dms: DmsConfig,
    pub engagement: EngagementConfig,
    pub alerting: AlertConfig,
    pub log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            dms: DmsConfig::default(),
            engagement: EngagementConfig::default(),
            alerting: AlertConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load from `path` (optional) with `GAZE__` environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Self::load_with_env(path, "GAZE")
    }

    pub fn load_with_env(path: impl AsRef<Path>, env_prefix: &str) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let config: MonitorConfig = Config::builder()
            .add_source(File::with_name(&path.to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
