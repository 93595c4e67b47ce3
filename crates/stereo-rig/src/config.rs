//! JSON configuration for preview and calibration runs.

use crate::{LogConfig, PreviewMode};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use stereo_rig_calib::{CaptureConfig, KeyBindings};
use stereo_rig_core::{CalibrationFile, ImageSize};
use stereo_rig_depth::MatcherParams;
use stereo_rig_source::{DualDeviceConfig, SplitFrameConfig};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_calibration_path() -> PathBuf {
    PathBuf::from("calibration.json")
}

fn default_poll_interval_ms() -> u64 {
    1
}

/// Which acquisition variant to drive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    SplitFrame(SplitFrameConfig),
    DualDevice(DualDeviceConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::SplitFrame(SplitFrameConfig::default())
    }
}

impl SourceConfig {
    /// Per-side frame size if it is known before attaching.
    pub fn frame_size(&self) -> Option<ImageSize> {
        match self {
            SourceConfig::SplitFrame(c) => Some(ImageSize::new(
                c.resolution.width / 2,
                c.resolution.height,
            )),
            SourceConfig::DualDevice(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub mode: PreviewMode,
    #[serde(default = "default_calibration_path")]
    pub calibration_path: PathBuf,
    /// Horizontal guide lines drawn on every view; 0 disables them.
    #[serde(default)]
    pub guide_lines: usize,
    /// Longest wait for a key per preview cycle.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub matcher: MatcherParams,
    #[serde(default)]
    pub keys: KeyBindings,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            mode: PreviewMode::default(),
            calibration_path: default_calibration_path(),
            guide_lines: 0,
            poll_interval_ms: default_poll_interval_ms(),
            matcher: MatcherParams::default(),
            keys: KeyBindings::default(),
            log: LogConfig::default(),
        }
    }
}

impl PreviewConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn calibration_file(&self) -> CalibrationFile {
        CalibrationFile::new(&self.calibration_path)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Where the solved parameters are written.
    #[serde(default = "default_calibration_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub keys: KeyBindings,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            capture: CaptureConfig::default(),
            output_path: default_calibration_path(),
            keys: KeyBindings::default(),
            log: LogConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn exporter(&self) -> CalibrationFile {
        CalibrationFile::new(&self.output_path)
    }
}
