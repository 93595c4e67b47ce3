//! Stereo rectification and overlap extraction.
//!
//! [`RectificationPipeline::build`] asks a [`RectificationSolver`] for
//! per-side [`RemapTable`]s and valid-pixel rectangles once per set of
//! calibration parameters; [`RectificationPipeline::apply`] then remaps every
//! frame pair through the cached tables. [`OverlapExtractor`] crops the
//! rectified pair to the region both cameras cover.

mod error;
mod overlap;
mod pipeline;
mod remap;

pub use error::{RectifyError, SolverError};
pub use overlap::OverlapExtractor;
pub use pipeline::{RectificationMaps, RectificationPipeline, RectificationSolver};
pub use remap::{RemapError, RemapTable};
