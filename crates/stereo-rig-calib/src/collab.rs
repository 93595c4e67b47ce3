//! Collaborators the session delegates to.

use crate::{CalibrationSampleSet, PatternSize};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use stereo_rig_core::{CalibrationFile, CalibrationFileError, CalibrationParameters, Image};

/// Finds the inner corners of a chessboard in a grayscale image.
pub trait PatternDetector {
    /// Ordered corners (row-major, `pattern.cols` per row) or `None` when the
    /// full pattern is not visible.
    fn detect(&mut self, gray: &Image, pattern: PatternSize) -> Option<Vec<Point2<f32>>>;
}

/// Termination and model settings handed to the stereo solver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    pub max_iterations: u32,
    pub epsilon: f64,
    /// Keep per-camera intrinsics fixed and only solve the extrinsics.
    pub fix_intrinsics: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            epsilon: 1e-5,
            fix_intrinsics: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StereoCalibration {
    pub params: CalibrationParameters,
    /// RMS reprojection error in pixels.
    pub reprojection_error: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("stereo calibration failed: {reason}")]
pub struct SolverError {
    pub reason: String,
}

impl SolverError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Estimates stereo parameters from accepted correspondences.
pub trait CalibrationSolver {
    fn solve(
        &self,
        samples: &CalibrationSampleSet,
        options: &SolveOptions,
    ) -> Result<StereoCalibration, SolverError>;
}

/// Persists calibration results.
pub trait CalibrationExporter {
    fn export(&self, params: &CalibrationParameters) -> Result<(), CalibrationFileError>;
}

impl CalibrationExporter for CalibrationFile {
    fn export(&self, params: &CalibrationParameters) -> Result<(), CalibrationFileError> {
        self.save(params)
    }
}
