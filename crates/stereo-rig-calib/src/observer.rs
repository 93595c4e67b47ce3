use nalgebra::Point2;
use stereo_rig_core::FramePair;

/// Per-cycle snapshot handed to a [`CaptureObserver`].
#[derive(Clone, Copy, Debug)]
pub struct CaptureFeedback<'a> {
    pub frames: &'a FramePair,
    pub left_corners: Option<&'a [Point2<f32>]>,
    pub right_corners: Option<&'a [Point2<f32>]>,
    pub accepted: usize,
    pub target: usize,
}

impl CaptureFeedback<'_> {
    pub fn both_found(&self) -> bool {
        self.left_corners.is_some() && self.right_corners.is_some()
    }
}

/// Receives capture progress, typically to render it for the operator.
pub trait CaptureObserver {
    fn on_frame(&mut self, feedback: &CaptureFeedback<'_>);

    fn on_accept(&mut self, _accepted: usize, _target: usize) {}

    fn on_reject(&mut self, _left_found: bool, _right_found: bool) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl CaptureObserver for NoopObserver {
    fn on_frame(&mut self, _feedback: &CaptureFeedback<'_>) {}
}

impl<O: CaptureObserver + ?Sized> CaptureObserver for &mut O {
    fn on_frame(&mut self, feedback: &CaptureFeedback<'_>) {
        (**self).on_frame(feedback)
    }

    fn on_accept(&mut self, accepted: usize, target: usize) {
        (**self).on_accept(accepted, target)
    }

    fn on_reject(&mut self, left_found: bool, right_found: bool) {
        (**self).on_reject(left_found, right_found)
    }
}
