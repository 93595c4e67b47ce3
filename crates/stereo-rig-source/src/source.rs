use crate::SourceError;
use std::ops::{Deref, DerefMut};
use stereo_rig_core::{FramePair, ImageSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceState {
    Detached,
    Attached,
}

/// A stereo camera producing one matched [`FramePair`] per read.
///
/// `attach` acquires every device or none: on failure all partially
/// acquired resources are already released when the error is returned.
/// `detach` is idempotent and never fails; release problems are logged.
pub trait FrameSource {
    fn attach(&mut self) -> Result<(), SourceError>;

    fn detach(&mut self);

    /// Grab one synchronized pair. Both images come from the same cycle;
    /// if either side fails the whole cycle is reported as an error.
    fn read(&mut self) -> Result<FramePair, SourceError>;

    fn state(&self) -> SourceState;

    /// Per-side frame size, known once attached.
    fn frame_size(&self) -> Option<ImageSize>;

    fn is_attached(&self) -> bool {
        self.state() == SourceState::Attached
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn attach(&mut self) -> Result<(), SourceError> {
        (**self).attach()
    }

    fn detach(&mut self) {
        (**self).detach()
    }

    fn read(&mut self) -> Result<FramePair, SourceError> {
        (**self).read()
    }

    fn state(&self) -> SourceState {
        (**self).state()
    }

    fn frame_size(&self) -> Option<ImageSize> {
        (**self).frame_size()
    }
}

/// Keeps a source attached for the guard's lifetime and detaches it on drop,
/// including early returns and unwinding.
pub struct AttachGuard<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FrameSource + ?Sized> AttachGuard<'a, S> {
    /// Attach `source` unless it already is.
    pub fn attach(source: &'a mut S) -> Result<Self, SourceError> {
        if !source.is_attached() {
            source.attach()?;
        }
        Ok(Self { source })
    }
}

impl<S: FrameSource + ?Sized> Deref for AttachGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: FrameSource + ?Sized> DerefMut for AttachGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: FrameSource + ?Sized> Drop for AttachGuard<'_, S> {
    fn drop(&mut self) {
        self.source.detach();
    }
}
