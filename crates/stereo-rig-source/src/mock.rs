//! Scripted devices that record every driver call.

use crate::{
    AccessMode, CameraSdk, CaptureBackend, CaptureDevice, DeviceError, DeviceInfo, SdkCamera,
    Transport, TriggerMode,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stereo_rig_core::{Image, ImageSize, PixelFormat};

type Script = VecDeque<Result<Image, DeviceError>>;

#[derive(Clone, Default)]
pub(crate) struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().expect("recorder lock").clone()
    }

    fn fail_on(&self, prefix: &str) {
        self.failing
            .lock()
            .expect("recorder lock")
            .push(prefix.to_string());
    }

    /// Record `event`; fail it if a registered prefix matches.
    fn call(&self, event: String) -> Result<(), DeviceError> {
        let fails = self
            .failing
            .lock()
            .expect("recorder lock")
            .iter()
            .any(|p| event.starts_with(p.as_str()));
        self.events.lock().expect("recorder lock").push(event);
        if fails {
            Err(DeviceError::Status {
                op: "mock",
                code: 0x8000_0003,
            })
        } else {
            Ok(())
        }
    }
}

fn filled(size: ImageSize, value: u8) -> Image {
    let mut img = Image::zeros(size.width, size.height, PixelFormat::Gray8);
    img.data.fill(value);
    img
}

pub(crate) struct MockBackend {
    rec: Recorder,
    frames: Script,
}

impl MockBackend {
    pub(crate) fn new(rec: Recorder) -> Self {
        Self {
            rec,
            frames: VecDeque::new(),
        }
    }

    pub(crate) fn with_frames(
        mut self,
        frames: impl IntoIterator<Item = Result<Image, DeviceError>>,
    ) -> Self {
        self.frames.extend(frames);
        self
    }

    pub(crate) fn failing_open(self) -> Self {
        self.rec.fail_on("open");
        self
    }
}

pub(crate) struct MockDevice {
    rec: Recorder,
    index: u32,
    resolution: ImageSize,
    frames: Script,
}

impl CaptureBackend for MockBackend {
    type Device = MockDevice;

    fn open(&mut self, index: u32, resolution: ImageSize) -> Result<MockDevice, DeviceError> {
        self.rec.call(format!("open {index} {resolution}"))?;
        Ok(MockDevice {
            rec: self.rec.clone(),
            index,
            resolution,
            frames: std::mem::take(&mut self.frames),
        })
    }
}

impl CaptureDevice for MockDevice {
    fn read_frame(&mut self) -> Result<Image, DeviceError> {
        self.frames
            .pop_front()
            .unwrap_or_else(|| Ok(filled(self.resolution, 0)))
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        self.rec.call(format!("release {}", self.index))
    }
}

pub(crate) struct MockSdk {
    rec: Recorder,
    devices: Vec<DeviceInfo>,
    right_resolution: ImageSize,
    right_frames: Script,
}

impl MockSdk {
    /// A GigE camera `L` and a USB camera `R`, both 4x3.
    pub(crate) fn two_cameras(rec: Recorder) -> Self {
        Self {
            rec,
            devices: vec![
                DeviceInfo {
                    transport: Transport::GigE,
                    model: "MV-CA013".into(),
                    serial: "L".into(),
                },
                DeviceInfo {
                    transport: Transport::Usb,
                    model: "MV-CS016".into(),
                    serial: "R".into(),
                },
            ],
            right_resolution: ImageSize::new(4, 3),
            right_frames: VecDeque::new(),
        }
    }

    pub(crate) fn with_device_count(mut self, n: usize) -> Self {
        self.devices.truncate(n);
        self
    }

    pub(crate) fn failing(self, prefix: &str) -> Self {
        self.rec.fail_on(prefix);
        self
    }

    pub(crate) fn with_right_resolution(mut self, size: ImageSize) -> Self {
        self.right_resolution = size;
        self
    }

    pub(crate) fn with_right_frames(
        mut self,
        frames: impl IntoIterator<Item = Result<Image, DeviceError>>,
    ) -> Self {
        self.right_frames.extend(frames);
        self
    }
}

impl CameraSdk for MockSdk {
    type Camera = MockCamera;

    fn initialize(&mut self) -> Result<(), DeviceError> {
        self.rec.call("initialize".into())
    }

    fn finalize(&mut self) -> Result<(), DeviceError> {
        self.rec.call("finalize".into())
    }

    fn enumerate(&mut self, transports: &[Transport]) -> Result<Vec<DeviceInfo>, DeviceError> {
        self.rec.call(format!("enumerate {transports:?}"))?;
        Ok(self
            .devices
            .iter()
            .filter(|d| transports.contains(&d.transport))
            .cloned()
            .collect())
    }

    fn create(&mut self, info: &DeviceInfo) -> Result<MockCamera, DeviceError> {
        self.rec.call(format!("create {}", info.serial))?;
        let is_right = info.serial == "R";
        Ok(MockCamera {
            rec: self.rec.clone(),
            name: info.serial.clone(),
            resolution: if is_right {
                self.right_resolution
            } else {
                ImageSize::new(4, 3)
            },
            frames: if is_right {
                std::mem::take(&mut self.right_frames)
            } else {
                VecDeque::new()
            },
            grabbed: 0,
        })
    }
}

pub(crate) struct MockCamera {
    rec: Recorder,
    name: String,
    resolution: ImageSize,
    frames: Script,
    grabbed: u8,
}

impl SdkCamera for MockCamera {
    fn open(&mut self, access: AccessMode) -> Result<(), DeviceError> {
        self.rec.call(format!("open {} {access:?}", self.name))
    }

    fn optimal_packet_size(&mut self) -> Result<u32, DeviceError> {
        Ok(8164)
    }

    fn set_packet_size(&mut self, bytes: u32) -> Result<(), DeviceError> {
        self.rec.call(format!("packet size {} {bytes}", self.name))
    }

    fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), DeviceError> {
        self.rec.call(format!("trigger {} {mode:?}", self.name))
    }

    fn resolution(&mut self) -> Result<ImageSize, DeviceError> {
        self.rec.call(format!("resolution {}", self.name))?;
        Ok(self.resolution)
    }

    fn start_grabbing(&mut self) -> Result<(), DeviceError> {
        self.rec.call(format!("start {}", self.name))
    }

    fn stop_grabbing(&mut self) -> Result<(), DeviceError> {
        self.rec.call(format!("stop {}", self.name))
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.rec.call(format!("close {}", self.name))
    }

    fn destroy(&mut self) -> Result<(), DeviceError> {
        self.rec.call(format!("destroy {}", self.name))
    }

    fn grab(&mut self, _timeout: Duration) -> Result<Image, DeviceError> {
        let n = self.grabbed;
        self.grabbed = self.grabbed.wrapping_add(1);
        self.frames
            .pop_front()
            .unwrap_or_else(|| Ok(filled(self.resolution, n)))
    }
}
