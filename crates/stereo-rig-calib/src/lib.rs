//! Interactive stereo calibration.
//!
//! A [`CalibrationSession`] reads frame pairs from a
//! [`stereo_rig_source::FrameSource`], runs a [`PatternDetector`] on both
//! views and keeps a correspondence whenever the operator sends
//! [`Command::Accept`] while both sides see the board. The collected
//! [`CalibrationSampleSet`] is then handed to a [`CalibrationSolver`] and the
//! result persisted through a [`CalibrationExporter`].
//!
//! Commands arrive over a `crossbeam-channel` receiver; [`KeyBindings`]
//! translates raw key codes at the input boundary.

mod board;
mod collab;
mod command;
mod observer;
mod sample;
mod session;

pub use board::{BoardSpec, PatternSize};
pub use collab::{
    CalibrationExporter, CalibrationSolver, PatternDetector, SolveOptions, SolverError,
    StereoCalibration,
};
pub use command::{Command, KeyBindings};
pub use observer::{CaptureFeedback, CaptureObserver, NoopObserver};
pub use sample::{CalibrationSampleSet, CorrespondenceSample, SampleError};
pub use session::{
    CalibrationSession, CaptureConfig, CaptureOutcome, Completion, SessionError, SessionReport,
};
