//! Stereo frame acquisition.
//!
//! Two [`FrameSource`] implementations are provided:
//!
//! - [`SplitFrameSource`]: one device delivering both views side by side,
//!   split at the vertical midpoint.
//! - [`DualDeviceSource`]: two cameras driven through a [`CameraSdk`],
//!   grabbed concurrently and paired per cycle.
//!
//! Device drivers plug in through [`CaptureBackend`] and [`CameraSdk`].
//! Every source hands out BGR frames regardless of the sensor format.
//!
//! ```ignore
//! use stereo_rig_source::{AttachGuard, FrameSource};
//!
//! let mut guard = AttachGuard::attach(&mut source)?;
//! loop {
//!     match guard.read() {
//!         Ok(pair) => show(&pair),
//!         Err(e) if e.is_transient() => log::warn!("{e}"),
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! // dropping the guard detaches the source
//! ```

mod dual;
mod error;
#[cfg(test)]
mod mock;
mod source;
mod split;

pub use dual::{
    AccessMode, CameraSdk, DeviceInfo, DualDeviceConfig, DualDeviceSource, SdkCamera, Transport,
    TriggerMode,
};
pub use error::{DeviceError, SourceError};
pub use source::{AttachGuard, FrameSource, SourceState};
pub use split::{CaptureBackend, CaptureDevice, SplitFrameConfig, SplitFrameSource};
