use crate::{DepthBounds, DisparityField, InvalidParams, MatcherParams, RawDisparity};
use stereo_rig_core::{Image, ImageSize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Failure reported by a [`StereoMatcher`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct MatcherError {
    pub reason: String,
}

impl MatcherError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Dense stereo matcher over a rectified grayscale pair.
pub trait StereoMatcher {
    fn compute(
        &mut self,
        left: &Image,
        right: &Image,
        params: &MatcherParams,
    ) -> Result<RawDisparity, MatcherError>;
}

impl<M: StereoMatcher + ?Sized> StereoMatcher for Box<M> {
    fn compute(
        &mut self,
        left: &Image,
        right: &Image,
        params: &MatcherParams,
    ) -> Result<RawDisparity, MatcherError> {
        (**self).compute(left, right, params)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DepthError {
    #[error(transparent)]
    InvalidParams(#[from] InvalidParams),
    #[error("left image is {left}, right image is {right}")]
    SizeMismatch { left: ImageSize, right: ImageSize },
    #[error("stereo matcher failed: {0}")]
    Matcher(#[from] MatcherError),
    #[error("matcher returned {got} disparities for a {expected} input")]
    OutputSize { expected: ImageSize, got: ImageSize },
}

/// Disparity field for one overlap pair plus its near/far bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthEstimate {
    pub field: DisparityField,
    /// `None` when the field is empty or has no valid pixel.
    pub bounds: Option<DepthBounds>,
}

impl DepthEstimate {
    pub fn empty() -> Self {
        Self {
            field: DisparityField::empty(),
            bounds: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    /// JET-coloured disparity, or `None` for an empty estimate.
    pub fn colorized(&self) -> Option<Image> {
        (!self.field.is_empty()).then(|| self.field.colorize())
    }
}

/// Runs the matcher on overlap crops and post-processes its output.
pub struct DepthEstimator<M> {
    matcher: M,
    params: MatcherParams,
}

impl<M: StereoMatcher> DepthEstimator<M> {
    pub fn new(matcher: M, params: MatcherParams) -> Result<Self, DepthError> {
        params.validate()?;
        Ok(Self { matcher, params })
    }

    pub fn params(&self) -> &MatcherParams {
        &self.params
    }

    /// Estimate disparity between two overlap crops of equal size.
    ///
    /// Inputs are converted to grayscale first. An empty side short-circuits
    /// to [`DepthEstimate::empty`] without invoking the matcher.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(size = %left.size()))
    )]
    pub fn estimate(&mut self, left: &Image, right: &Image) -> Result<DepthEstimate, DepthError> {
        if left.is_empty() || right.is_empty() {
            log::debug!("empty overlap, skipping disparity");
            return Ok(DepthEstimate::empty());
        }
        if left.size() != right.size() {
            return Err(DepthError::SizeMismatch {
                left: left.size(),
                right: right.size(),
            });
        }

        let raw = self
            .matcher
            .compute(&left.to_gray(), &right.to_gray(), &self.params)?;
        if raw.size() != left.size() || raw.data.len() != raw.size().area() {
            return Err(DepthError::OutputSize {
                expected: left.size(),
                got: raw.size(),
            });
        }

        let field = DisparityField::from_raw(&raw, self.params.min_disparity);
        let bounds = field.bounds();
        match bounds {
            Some(b) => log::trace!("disparity range {:.2}..{:.2}", b.min, b.max),
            None => log::debug!("no valid disparity in {}", field.size()),
        }
        Ok(DepthEstimate { field, bounds })
    }
}
