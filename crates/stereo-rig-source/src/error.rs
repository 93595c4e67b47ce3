use std::time::Duration;
use stereo_rig_core::{ImageError, ImageSize, Side};

/// Failure reported by a device driver or camera SDK.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("{op} failed (ret 0x{code:08x})")]
    Status { op: &'static str, code: u32 },
    #[error("device `{0}` not found")]
    NotFound(String),
    #[error("no frame within {0:?}")]
    Timeout(Duration),
    #[error("device returned an empty frame")]
    EmptyFrame,
    #[error("device disconnected")]
    Disconnected,
    #[error("acquisition worker panicked")]
    WorkerPanicked,
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Errors returned by [`crate::FrameSource`] implementations.
///
/// Acquisition failures (`Device`, `NotEnoughDevices`, `DeviceIndexOutOfRange`,
/// `DuplicateDeviceIndex`, `ResolutionMismatch`) are fatal to `attach`; read
/// failures are transient and only cost the current cycle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("{stage} failed on {device}: {source}")]
    Device {
        stage: &'static str,
        device: String,
        #[source]
        source: DeviceError,
    },
    #[error("not enough cameras (found {found}, need {required})")]
    NotEnoughDevices { found: usize, required: usize },
    #[error("{side} camera index {index} is out of range ({found} devices found)")]
    DeviceIndexOutOfRange {
        side: Side,
        index: usize,
        found: usize,
    },
    #[error("left and right cameras both use device index {index}")]
    DuplicateDeviceIndex { index: usize },
    #[error("camera resolutions differ (left {left}, right {right})")]
    ResolutionMismatch { left: ImageSize, right: ImageSize },
    #[error("failed to read {device}: {source}")]
    ReadFailed {
        device: String,
        #[source]
        source: DeviceError,
    },
    #[error("{side} camera produced no frame within {timeout:?}")]
    Timeout { side: Side, timeout: Duration },
    #[error("frame sizes differ (left {left}, right {right})")]
    PairMismatch { left: ImageSize, right: ImageSize },
    #[error("frame source is not attached")]
    NotAttached,
    #[error("frame source is already attached")]
    AlreadyAttached,
}

impl SourceError {
    /// Whether the error only invalidates the current acquisition cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::ReadFailed { .. }
                | SourceError::Timeout { .. }
                | SourceError::PairMismatch { .. }
        )
    }
}
