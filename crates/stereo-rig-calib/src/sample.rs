use nalgebra::{Point2, Point3};
use stereo_rig_core::{ImageSize, Side};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("{side} view has {got} corners, board template has {expected}")]
    CornerCount {
        side: Side,
        expected: usize,
        got: usize,
    },
    #[error("frame size {got} differs from earlier samples ({expected})")]
    ImageSize { expected: ImageSize, got: ImageSize },
}

/// One matched pair of detected corner sets.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrespondenceSample {
    pub left: Vec<Point2<f32>>,
    pub right: Vec<Point2<f32>>,
}

/// Accepted correspondences plus the board template they all share.
///
/// Grows monotonically; every sample has exactly one corner per template
/// point on each side and all samples come from frames of the same size.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationSampleSet {
    object_points: Vec<Point3<f32>>,
    image_size: Option<ImageSize>,
    samples: Vec<CorrespondenceSample>,
}

impl CalibrationSampleSet {
    pub fn new(object_points: Vec<Point3<f32>>) -> Self {
        Self {
            object_points,
            image_size: None,
            samples: Vec::new(),
        }
    }

    /// Append a sample taken from a frame of `size`; returns the new count.
    pub fn push(
        &mut self,
        size: ImageSize,
        left: Vec<Point2<f32>>,
        right: Vec<Point2<f32>>,
    ) -> Result<usize, SampleError> {
        let expected = self.object_points.len();
        for (side, corners) in [(Side::Left, &left), (Side::Right, &right)] {
            if corners.len() != expected {
                return Err(SampleError::CornerCount {
                    side,
                    expected,
                    got: corners.len(),
                });
            }
        }
        match self.image_size {
            Some(expected) if expected != size => {
                return Err(SampleError::ImageSize {
                    expected,
                    got: size,
                })
            }
            _ => self.image_size = Some(size),
        }
        self.samples.push(CorrespondenceSample { left, right });
        Ok(self.samples.len())
    }

    pub fn object_points(&self) -> &[Point3<f32>] {
        &self.object_points
    }

    /// Per-side frame size of the samples, once at least one was accepted.
    pub fn image_size(&self) -> Option<ImageSize> {
        self.image_size
    }

    pub fn samples(&self) -> &[CorrespondenceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
