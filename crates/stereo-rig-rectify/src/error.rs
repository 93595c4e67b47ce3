use stereo_rig_core::{ImageSize, ParamsError, Side};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("invalid calibration parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("rectification solver failed: {0}")]
    Solver(#[from] SolverError),
    #[error("frame size must be non-zero")]
    EmptyFrameSize,
    #[error("{side} remap table is {got}, expected {expected}")]
    TableSize {
        side: Side,
        expected: ImageSize,
        got: ImageSize,
    },
    #[error("{side} frame is {got}, rectification was built for {expected}")]
    FrameSize {
        side: Side,
        expected: ImageSize,
        got: ImageSize,
    },
}

impl RectifyError {
    /// Build-time errors are fatal; a mis-sized frame only costs that frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RectifyError::FrameSize { .. })
    }
}

/// Failure reported by a [`crate::RectificationSolver`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
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
