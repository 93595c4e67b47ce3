use crate::{RectifyError, RemapTable, SolverError};
use stereo_rig_core::{CalibrationParameters, FramePair, ImageSize, Roi, Side};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Remap tables and valid-pixel rectangles for both cameras.
#[derive(Clone, Debug, PartialEq)]
pub struct RectificationMaps {
    pub left: RemapTable,
    pub right: RemapTable,
    pub roi_left: Roi,
    pub roi_right: Roi,
}

impl RectificationMaps {
    pub fn table(&self, side: Side) -> &RemapTable {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn roi(&self, side: Side) -> Roi {
        match side {
            Side::Left => self.roi_left,
            Side::Right => self.roi_right,
        }
    }
}

/// Computes rectifying remap tables from stereo calibration.
pub trait RectificationSolver {
    /// `size` is the per-side frame size the tables must produce.
    fn solve(
        &self,
        params: &CalibrationParameters,
        size: ImageSize,
    ) -> Result<RectificationMaps, SolverError>;
}

/// Per-frame stereo rectification with tables computed once at build time.
#[derive(Clone, Debug)]
pub struct RectificationPipeline {
    maps: RectificationMaps,
    frame_size: ImageSize,
}

impl RectificationPipeline {
    /// Validate `params`, ask `solver` for tables at `frame_size` and check
    /// they match. Any failure here must keep the caller out of its frame loop.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(solver, params), fields(size = %frame_size))
    )]
    pub fn build<S: RectificationSolver + ?Sized>(
        solver: &S,
        params: &CalibrationParameters,
        frame_size: ImageSize,
    ) -> Result<Self, RectifyError> {
        if frame_size.is_empty() {
            return Err(RectifyError::EmptyFrameSize);
        }
        params.validate()?;
        let maps = solver.solve(params, frame_size)?;

        for side in [Side::Left, Side::Right] {
            let got = maps.table(side).size();
            if got != frame_size {
                return Err(RectifyError::TableSize {
                    side,
                    expected: frame_size,
                    got,
                });
            }
        }
        log::info!(
            "rectification ready for {frame_size}: roi left {}, roi right {}",
            maps.roi_left,
            maps.roi_right
        );
        Ok(Self { maps, frame_size })
    }

    /// Wrap tables computed elsewhere, e.g. restored from a cache.
    pub fn from_maps(maps: RectificationMaps) -> Result<Self, RectifyError> {
        let frame_size = maps.left.size();
        if frame_size.is_empty() {
            return Err(RectifyError::EmptyFrameSize);
        }
        let got = maps.right.size();
        if got != frame_size {
            return Err(RectifyError::TableSize {
                side: Side::Right,
                expected: frame_size,
                got,
            });
        }
        Ok(Self { maps, frame_size })
    }

    pub fn frame_size(&self) -> ImageSize {
        self.frame_size
    }

    pub fn maps(&self) -> &RectificationMaps {
        &self.maps
    }

    pub fn roi(&self, side: Side) -> Roi {
        self.maps.roi(side)
    }

    /// Rectify both sides. Pure: the same pair always yields the same output.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn apply(&self, frames: &FramePair) -> Result<FramePair, RectifyError> {
        for side in [Side::Left, Side::Right] {
            let got = frames.get(side).size();
            if got != self.frame_size {
                return Err(RectifyError::FrameSize {
                    side,
                    expected: self.frame_size,
                    got,
                });
            }
        }
        Ok(FramePair::new(
            self.maps.left.remap(&frames.left),
            self.maps.right.remap(&frames.right),
        ))
    }
}
