//! Two independent cameras driven through a vendor camera SDK.
//!
//! Acquisition order is fixed: initialize the SDK, enumerate devices on the
//! configured transports, then for each side create a handle, open it,
//! tune the GigE packet size and set the trigger mode. Grabbing starts on
//! both sides only once both are open. Teardown walks the same steps in
//! reverse and is shared by `detach` and by a failed `attach`.

use crate::{DeviceError, FrameSource, SourceError, SourceState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stereo_rig_core::{FramePair, Image, ImageSize, Side};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    GigE,
    Usb,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub transport: Transport,
    pub model: String,
    pub serial: String,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?}, s/n {})", self.model, self.transport, self.serial)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    #[default]
    Exclusive,
    Control,
    Monitor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Free-running acquisition.
    #[default]
    Off,
    /// Frames are triggered by an external hardware line.
    Hardware,
}

/// Process-wide camera SDK entry points.
pub trait CameraSdk {
    type Camera: SdkCamera;

    fn initialize(&mut self) -> Result<(), DeviceError>;

    fn finalize(&mut self) -> Result<(), DeviceError>;

    fn enumerate(&mut self, transports: &[Transport]) -> Result<Vec<DeviceInfo>, DeviceError>;

    fn create(&mut self, info: &DeviceInfo) -> Result<Self::Camera, DeviceError>;
}

/// One camera handle. Reads of the two cameras run on separate threads,
/// hence `Send`.
pub trait SdkCamera: Send {
    fn open(&mut self, access: AccessMode) -> Result<(), DeviceError>;

    fn optimal_packet_size(&mut self) -> Result<u32, DeviceError>;

    fn set_packet_size(&mut self, bytes: u32) -> Result<(), DeviceError>;

    fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), DeviceError>;

    fn resolution(&mut self) -> Result<ImageSize, DeviceError>;

    fn start_grabbing(&mut self) -> Result<(), DeviceError>;

    fn stop_grabbing(&mut self) -> Result<(), DeviceError>;

    fn close(&mut self) -> Result<(), DeviceError>;

    fn destroy(&mut self) -> Result<(), DeviceError>;

    /// Wait at most `timeout` for the next frame. Raw frames may be mono
    /// or Bayer.
    fn grab(&mut self, timeout: Duration) -> Result<Image, DeviceError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualDeviceConfig {
    /// Index into the enumerated device list.
    pub left_index: usize,
    pub right_index: usize,
    pub transports: Vec<Transport>,
    pub access: AccessMode,
    pub trigger: TriggerMode,
    pub grab_timeout_ms: u64,
    /// Grab both sides concurrently instead of one after the other.
    pub parallel_reads: bool,
}

impl Default for DualDeviceConfig {
    fn default() -> Self {
        Self {
            left_index: 0,
            right_index: 1,
            transports: vec![Transport::GigE, Transport::Usb],
            access: AccessMode::Exclusive,
            trigger: TriggerMode::Off,
            grab_timeout_ms: 1000,
            parallel_reads: true,
        }
    }
}

impl DualDeviceConfig {
    pub fn grab_timeout(&self) -> Duration {
        Duration::from_millis(self.grab_timeout_ms)
    }
}

/// Per-side handle plus how far acquisition got on it.
struct CameraSlot<C> {
    side: Side,
    camera: C,
    opened: bool,
    grabbing: bool,
}

impl<C: SdkCamera> CameraSlot<C> {
    fn new(side: Side, camera: C) -> Self {
        Self {
            side,
            camera,
            opened: false,
            grabbing: false,
        }
    }

    fn stop(&mut self) {
        if self.grabbing {
            if let Err(e) = self.camera.stop_grabbing() {
                log::warn!("stop grabbing on {} camera failed: {e}", self.side);
            }
            self.grabbing = false;
        }
    }

    fn release(mut self) {
        self.stop();
        if self.opened {
            if let Err(e) = self.camera.close() {
                log::warn!("closing {} camera failed: {e}", self.side);
            }
        }
        if let Err(e) = self.camera.destroy() {
            log::warn!("destroying {} camera handle failed: {e}", self.side);
        }
        log::debug!("{} camera released", self.side);
    }
}

fn camera_label(side: Side) -> String {
    format!("{side} camera")
}

/// Stereo source built from two separately enumerated SDK cameras.
pub struct DualDeviceSource<S: CameraSdk> {
    sdk: S,
    config: DualDeviceConfig,
    sdk_ready: bool,
    attached: bool,
    left: Option<CameraSlot<S::Camera>>,
    right: Option<CameraSlot<S::Camera>>,
    frame_size: Option<ImageSize>,
}

impl<S: CameraSdk> DualDeviceSource<S> {
    pub fn new(sdk: S, config: DualDeviceConfig) -> Self {
        Self {
            sdk,
            config,
            sdk_ready: false,
            attached: false,
            left: None,
            right: None,
            frame_size: None,
        }
    }

    pub fn config(&self) -> &DualDeviceConfig {
        &self.config
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<CameraSlot<S::Camera>> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn try_attach(&mut self) -> Result<(), SourceError> {
        self.sdk.initialize().map_err(|source| SourceError::Device {
            stage: "initialize",
            device: "camera sdk".into(),
            source,
        })?;
        self.sdk_ready = true;

        let devices = self
            .sdk
            .enumerate(&self.config.transports)
            .map_err(|source| SourceError::Device {
                stage: "enumerate",
                device: "camera sdk".into(),
                source,
            })?;
        log::info!("found {} camera(s)", devices.len());
        for (i, d) in devices.iter().enumerate() {
            log::debug!("  [{i}] {d}");
        }
        if devices.len() < 2 {
            return Err(SourceError::NotEnoughDevices {
                found: devices.len(),
                required: 2,
            });
        }

        let mut picked = Vec::with_capacity(2);
        for (side, index) in [
            (Side::Left, self.config.left_index),
            (Side::Right, self.config.right_index),
        ] {
            let info = devices
                .get(index)
                .ok_or(SourceError::DeviceIndexOutOfRange {
                    side,
                    index,
                    found: devices.len(),
                })?;
            picked.push((side, info.clone()));
        }

        let mut sizes = Vec::with_capacity(2);
        for (side, info) in &picked {
            sizes.push(self.connect(*side, info)?);
        }
        let (left, right) = (sizes[0], sizes[1]);
        if left != right {
            return Err(SourceError::ResolutionMismatch { left, right });
        }

        for side in [Side::Left, Side::Right] {
            if let Some(slot) = self.slot_mut(side).as_mut() {
                slot.camera
                    .start_grabbing()
                    .map_err(|source| SourceError::Device {
                        stage: "start grabbing",
                        device: camera_label(side),
                        source,
                    })?;
                slot.grabbing = true;
            }
        }
        self.frame_size = Some(left);
        Ok(())
    }

    /// Create and configure one side; returns its native resolution.
    fn connect(&mut self, side: Side, info: &DeviceInfo) -> Result<ImageSize, SourceError> {
        let dev_err = |stage: &'static str| {
            move |source| SourceError::Device {
                stage,
                device: camera_label(side),
                source,
            }
        };
        let access = self.config.access;
        let trigger = self.config.trigger;

        log::info!("connecting {side} camera: {info}");
        let camera = self.sdk.create(info).map_err(dev_err("create handle"))?;
        let slot = self.slot_mut(side).insert(CameraSlot::new(side, camera));

        slot.camera.open(access).map_err(dev_err("open"))?;
        slot.opened = true;

        if info.transport == Transport::GigE {
            match slot.camera.optimal_packet_size() {
                Ok(bytes) if bytes > 0 => {
                    if let Err(e) = slot.camera.set_packet_size(bytes) {
                        log::warn!("{side} camera: setting packet size {bytes} failed: {e}");
                    }
                }
                Ok(_) => log::warn!("{side} camera reported no optimal packet size"),
                Err(e) => log::warn!("{side} camera: querying packet size failed: {e}"),
            }
        }

        slot.camera
            .set_trigger_mode(trigger)
            .map_err(dev_err("set trigger mode"))?;
        slot.camera.resolution().map_err(dev_err("query resolution"))
    }

    /// Release everything acquired so far, right side first.
    fn teardown(&mut self) {
        self.attached = false;
        self.frame_size = None;
        for side in [Side::Right, Side::Left] {
            if let Some(slot) = self.slot_mut(side).as_mut() {
                slot.stop();
            }
        }
        for side in [Side::Right, Side::Left] {
            if let Some(slot) = self.slot_mut(side).take() {
                slot.release();
            }
        }
        if self.sdk_ready {
            if let Err(e) = self.sdk.finalize() {
                log::warn!("finalizing camera sdk failed: {e}");
            }
            self.sdk_ready = false;
        }
    }
}

fn read_error(side: Side, timeout: Duration, source: DeviceError) -> SourceError {
    match source {
        DeviceError::Timeout(_) => SourceError::Timeout { side, timeout },
        source => SourceError::ReadFailed {
            device: camera_label(side),
            source,
        },
    }
}

impl<S: CameraSdk> FrameSource for DualDeviceSource<S> {
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    fn attach(&mut self) -> Result<(), SourceError> {
        if self.attached {
            return Err(SourceError::AlreadyAttached);
        }
        if self.config.left_index == self.config.right_index {
            return Err(SourceError::DuplicateDeviceIndex {
                index: self.config.left_index,
            });
        }
        match self.try_attach() {
            Ok(()) => {
                self.attached = true;
                log::info!("both cameras grabbing");
                Ok(())
            }
            Err(e) => {
                log::error!("attach failed: {e}; releasing acquired devices");
                self.teardown();
                Err(e)
            }
        }
    }

    fn detach(&mut self) {
        if !self.sdk_ready && self.left.is_none() && self.right.is_none() {
            return;
        }
        log::info!("detaching cameras");
        self.teardown();
    }

    fn read(&mut self) -> Result<FramePair, SourceError> {
        if !self.attached {
            return Err(SourceError::NotAttached);
        }
        let timeout = self.config.grab_timeout();
        let parallel = self.config.parallel_reads;
        let (Some(left), Some(right)) = (self.left.as_mut(), self.right.as_mut()) else {
            return Err(SourceError::NotAttached);
        };

        let (l, r) = if parallel {
            std::thread::scope(|s| {
                let worker = s.spawn(|| left.camera.grab(timeout));
                let r = right.camera.grab(timeout);
                let l = worker
                    .join()
                    .unwrap_or(Err(DeviceError::WorkerPanicked));
                (l, r)
            })
        } else {
            (left.camera.grab(timeout), right.camera.grab(timeout))
        };

        let (l, r) = match (l, r) {
            (Ok(l), Ok(r)) => (l, r),
            (Err(e), other) => {
                if other.is_ok() {
                    log::debug!("discarding right frame from failed cycle");
                }
                return Err(read_error(Side::Left, timeout, e));
            }
            (Ok(_), Err(e)) => {
                log::debug!("discarding left frame from failed cycle");
                return Err(read_error(Side::Right, timeout, e));
            }
        };

        let pair = FramePair::new(l.to_bgr(), r.to_bgr());
        if pair.size().is_none() {
            return Err(SourceError::PairMismatch {
                left: pair.left.size(),
                right: pair.right.size(),
            });
        }
        Ok(pair)
    }

    fn state(&self) -> SourceState {
        if self.attached {
            SourceState::Attached
        } else {
            SourceState::Detached
        }
    }

    fn frame_size(&self) -> Option<ImageSize> {
        self.frame_size
    }
}

impl<S: CameraSdk> Drop for DualDeviceSource<S> {
    fn drop(&mut self) {
        self.detach();
    }
}
