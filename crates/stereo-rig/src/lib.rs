//! High-level facade for the `stereo-rig-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates
//! - [`PreviewOrchestrator`], composing capture, rectification, overlap
//!   extraction and disparity into five live preview modes
//! - [`run_calibration`], an interactive calibration run driven by a
//!   [`CalibrationConfig`]
//! - JSON configuration ([`PreviewConfig`], [`CalibrationConfig`])
//! - [`init_logging`]: stderr logger, or a `tracing` subscriber with the
//!   `tracing` feature
//! - `stereo_rig::convert` (feature `image`): conversions to and from
//!   `image` buffers and PNG export of preview frames
//!
//! ## Pipeline
//!
//! ```text
//! FrameSource -> RectificationPipeline -> OverlapExtractor -> DepthEstimator -> PreviewSink
//! ```
//!
//! Device drivers, the pattern detector and the numerical solvers are
//! supplied by the caller through the traits in [`source`], [`calib`],
//! [`rectify`] and [`depth`].
//!
//! ## API map
//! - `stereo_rig::core`: images, ROIs, frame pairs, calibration parameters and archive.
//! - `stereo_rig::source`: split-frame and dual-device frame sources.
//! - `stereo_rig::calib`: calibration capture sessions.
//! - `stereo_rig::rectify`: remap tables, rectification and overlap extraction.
//! - `stereo_rig::depth`: disparity post-processing and depth bounds.

pub use stereo_rig_calib as calib;
pub use stereo_rig_core as core;
pub use stereo_rig_depth as depth;
pub use stereo_rig_rectify as rectify;
pub use stereo_rig_source as source;

#[cfg(feature = "image")]
pub mod convert;

mod calibration;
mod config;
mod logging;
mod preview;

pub use calibration::run_calibration;
pub use config::{CalibrationConfig, ConfigError, PreviewConfig, SourceConfig};
pub use logging::{init_logging, LogConfig, LogFormat, LoggingError};
pub use preview::{
    anaglyph, PreviewFrame, PreviewMode, PreviewOrchestrator, PreviewSink, PreviewStats,
    PreviewView,
};

pub use stereo_rig_calib::{Command, KeyBindings};
pub use stereo_rig_core::{CalibrationFile, CalibrationParameters, FramePair, Image, Roi};
pub use stereo_rig_source::{AttachGuard, FrameSource};

#[derive(thiserror::Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Source(#[from] source::SourceError),
    #[error(transparent)]
    Calibration(#[from] core::CalibrationFileError),
    #[error(transparent)]
    Rectify(#[from] rectify::RectifyError),
    #[error(transparent)]
    Depth(#[from] depth::DepthError),
    #[error("{0} preview needs a rectification pipeline")]
    MissingRectification(PreviewMode),
    #[error("depth preview needs a stereo matcher")]
    MissingMatcher,
}
