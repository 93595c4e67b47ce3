use crate::{Image, ImageSize};

/// Which camera of the rig a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A matched left/right image pair from one acquisition cycle.
///
/// Both images are always present: a failed cycle is reported as an error by
/// the frame source instead of a half-filled pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePair {
    pub left: Image,
    pub right: Image,
}

impl FramePair {
    pub fn new(left: Image, right: Image) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn get(&self, side: Side) -> &Image {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Per-side size; `None` if the two sides disagree.
    pub fn size(&self) -> Option<ImageSize> {
        let size = self.left.size();
        (size == self.right.size()).then_some(size)
    }

    /// Apply the same transform to both sides.
    pub fn map<F>(&self, mut f: F) -> FramePair
    where
        F: FnMut(&Image) -> Image,
    {
        FramePair {
            left: f(&self.left),
            right: f(&self.right),
        }
    }
}
