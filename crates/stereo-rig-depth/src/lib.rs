//! Disparity estimation over rectified overlap crops.
//!
//! [`DepthEstimator`] converts both crops to grayscale, hands them to a
//! [`StereoMatcher`] with [`MatcherParams`], scales the fixed-point result
//! into a [`DisparityField`] and reports its [`DepthBounds`]. Bounds are in
//! disparity pixels, a relative near/far indicator rather than metric depth.

mod colormap;
mod estimator;
mod field;
mod params;

pub use colormap::jet;
pub use estimator::{DepthError, DepthEstimate, DepthEstimator, MatcherError, StereoMatcher};
pub use field::{DepthBounds, DisparityField, RawDisparity, DISPARITY_SCALE};
pub use params::{InvalidParams, MatcherParams};
