//! Single device delivering both views side by side in one frame.

use crate::{DeviceError, FrameSource, SourceError, SourceState};
use serde::{Deserialize, Serialize};
use stereo_rig_core::{FramePair, Image, ImageSize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Opens capture devices by index.
pub trait CaptureBackend {
    type Device: CaptureDevice;

    /// Open device `index` and negotiate the combined `resolution`.
    fn open(&mut self, index: u32, resolution: ImageSize) -> Result<Self::Device, DeviceError>;
}

pub trait CaptureDevice {
    /// Blocking read of the next combined frame.
    fn read_frame(&mut self) -> Result<Image, DeviceError>;

    fn release(&mut self) -> Result<(), DeviceError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitFrameConfig {
    pub device_index: u32,
    /// Combined side-by-side resolution requested from the device.
    pub resolution: ImageSize,
}

impl Default for SplitFrameConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: ImageSize::new(2560, 720),
        }
    }
}

/// Splits each combined frame at `width / 2` into left and right views.
///
/// For an odd combined width both halves are `width / 2` wide and the last
/// column is dropped.
pub struct SplitFrameSource<B: CaptureBackend> {
    backend: B,
    config: SplitFrameConfig,
    device: Option<B::Device>,
}

impl<B: CaptureBackend> SplitFrameSource<B> {
    pub fn new(backend: B, config: SplitFrameConfig) -> Self {
        Self {
            backend,
            config,
            device: None,
        }
    }

    pub fn config(&self) -> &SplitFrameConfig {
        &self.config
    }

    fn label(&self) -> String {
        format!("capture device {}", self.config.device_index)
    }
}

impl<B: CaptureBackend> FrameSource for SplitFrameSource<B> {
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    fn attach(&mut self) -> Result<(), SourceError> {
        if self.device.is_some() {
            return Err(SourceError::AlreadyAttached);
        }
        let resolution = self.config.resolution;
        log::info!("opening {} at {resolution}", self.label());
        let device = self
            .backend
            .open(self.config.device_index, resolution)
            .map_err(|source| SourceError::Device {
                stage: "open",
                device: self.label(),
                source,
            })?;
        self.device = Some(device);
        log::info!("{} attached", self.label());
        Ok(())
    }

    fn detach(&mut self) {
        let Some(mut device) = self.device.take() else {
            return;
        };
        if let Err(e) = device.release() {
            log::warn!("releasing {} failed: {e}", self.label());
        }
        log::info!("{} released", self.label());
    }

    fn read(&mut self) -> Result<FramePair, SourceError> {
        let label = self.label();
        let device = self.device.as_mut().ok_or(SourceError::NotAttached)?;
        let frame = device
            .read_frame()
            .map_err(|source| SourceError::ReadFailed {
                device: label.clone(),
                source,
            })?;
        if frame.width < 2 || frame.height == 0 {
            return Err(SourceError::ReadFailed {
                device: label,
                source: DeviceError::EmptyFrame,
            });
        }
        let (left, right) = frame.to_bgr().split_vertical();
        Ok(FramePair::new(left, right))
    }

    fn state(&self) -> SourceState {
        if self.device.is_some() {
            SourceState::Attached
        } else {
            SourceState::Detached
        }
    }

    fn frame_size(&self) -> Option<ImageSize> {
        let r = self.config.resolution;
        self.device
            .as_ref()
            .map(|_| ImageSize::new(r.width / 2, r.height))
    }
}

impl<B: CaptureBackend> Drop for SplitFrameSource<B> {
    fn drop(&mut self) {
        self.detach();
    }
}
