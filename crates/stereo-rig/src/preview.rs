//! Live preview of the stereo pipeline.

use crate::PreviewError;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use stereo_rig_calib::Command;
use stereo_rig_core::{
    draw::{draw_guides, draw_rect, GUIDE_GREEN, OVERLAP_GREEN, ROI_BLUE},
    CalibrationFile, FramePair, Image, ImageSize, PixelFormat, Roi, Side,
};
use stereo_rig_depth::{DepthBounds, DepthEstimator, MatcherParams, StereoMatcher};
use stereo_rig_rectify::{OverlapExtractor, RectificationPipeline, RectificationSolver};
use std::time::Duration;
use stereo_rig_source::{AttachGuard, FrameSource};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    /// Both camera views as delivered.
    #[default]
    Raw,
    /// Rectified views with each camera's valid region and the overlap outlined.
    Rectified,
    /// Rectified views cropped to the overlap.
    Overlap,
    /// Red from the left overlap, cyan from the right.
    Anaglyph,
    /// JET-coloured disparity of the overlap.
    Depth,
}

impl PreviewMode {
    pub fn needs_rectification(self) -> bool {
        self != PreviewMode::Raw
    }

    pub fn needs_matcher(self) -> bool {
        self == PreviewMode::Depth
    }
}

impl std::fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PreviewMode::Raw => "raw",
            PreviewMode::Rectified => "rectified",
            PreviewMode::Overlap => "overlap",
            PreviewMode::Anaglyph => "anaglyph",
            PreviewMode::Depth => "depth",
        };
        f.write_str(name)
    }
}

/// One displayable image and the window it belongs in.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewView {
    pub title: &'static str,
    pub image: Image,
}

/// Everything rendered for one frame pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewFrame {
    pub mode: PreviewMode,
    /// Empty when there is nothing to show, e.g. the regions do not overlap.
    pub views: Vec<PreviewView>,
    pub overlap: Option<Roi>,
    pub depth: Option<DepthBounds>,
}

impl PreviewFrame {
    pub fn view(&self, title: &str) -> Option<&Image> {
        self.views
            .iter()
            .find(|v| v.title == title)
            .map(|v| &v.image)
    }
}

/// Display boundary: windows, files, or a network stream.
pub trait PreviewSink {
    fn show(&mut self, frame: &PreviewFrame);
}

impl<K: PreviewSink + ?Sized> PreviewSink for &mut K {
    fn show(&mut self, frame: &PreviewFrame) {
        (**self).show(frame)
    }
}

/// Counters reported when a preview loop ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub shown: usize,
    /// Cycles where the source delivered no pair.
    pub dropped: usize,
    /// Pairs whose processing failed.
    pub failed: usize,
}

/// Red channel from `left`, blue and green from `right`. Both must be BGR of
/// the same size.
pub fn anaglyph(left: &Image, right: &Image) -> Image {
    let mut out = Image::zeros(left.width, left.height, PixelFormat::Bgr8);
    let (l, r) = (left.to_bgr(), right.to_bgr());
    for ((o, lp), rp) in out
        .data
        .chunks_exact_mut(3)
        .zip(l.data.chunks_exact(3))
        .zip(r.data.chunks_exact(3))
    {
        o[0] = rp[0];
        o[1] = rp[1];
        o[2] = lp[2];
    }
    out
}

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct Rectification {
    pipeline: RectificationPipeline,
    overlap: OverlapExtractor,
}

/// Drives a [`FrameSource`] through the pipeline stages a [`PreviewMode`]
/// needs and hands each rendered frame to a [`PreviewSink`].
pub struct PreviewOrchestrator {
    mode: PreviewMode,
    guide_lines: usize,
    poll_interval: Duration,
    rectification: Option<Rectification>,
    depth: Option<DepthEstimator<Box<dyn StereoMatcher>>>,
}

impl PreviewOrchestrator {
    pub fn new(mode: PreviewMode) -> Self {
        Self {
            mode,
            guide_lines: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
            rectification: None,
            depth: None,
        }
    }

    pub fn with_guide_lines(mut self, lines: usize) -> Self {
        self.guide_lines = lines;
        self
    }

    /// Longest wait for a command after each cycle.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_rectification(mut self, pipeline: RectificationPipeline) -> Self {
        let overlap = OverlapExtractor::from_pipeline(&pipeline);
        self.rectification = Some(Rectification { pipeline, overlap });
        self
    }

    pub fn with_matcher(
        mut self,
        matcher: Box<dyn StereoMatcher>,
        params: MatcherParams,
    ) -> Result<Self, PreviewError> {
        self.depth = Some(DepthEstimator::new(matcher, params)?);
        Ok(self)
    }

    /// Load calibration from `calibration` and build the stages `mode` needs.
    ///
    /// Everything that can fail before the frame loop fails here.
    pub fn prepare(
        mode: PreviewMode,
        calibration: &CalibrationFile,
        solver: &dyn RectificationSolver,
        frame_size: ImageSize,
        matcher: Option<(Box<dyn StereoMatcher>, MatcherParams)>,
    ) -> Result<Self, PreviewError> {
        let mut preview = Self::new(mode);
        if mode.needs_rectification() {
            let params = calibration.load()?;
            let pipeline = RectificationPipeline::build(solver, &params, frame_size)?;
            preview = preview.with_rectification(pipeline);
        }
        if let Some((matcher, params)) = matcher {
            preview = preview.with_matcher(matcher, params)?;
        }
        preview.check()?;
        Ok(preview)
    }

    pub fn mode(&self) -> PreviewMode {
        self.mode
    }

    fn check(&self) -> Result<(), PreviewError> {
        if self.mode.needs_rectification() && self.rectification.is_none() {
            return Err(PreviewError::MissingRectification(self.mode));
        }
        if self.mode.needs_matcher() && self.depth.is_none() {
            return Err(PreviewError::MissingMatcher);
        }
        Ok(())
    }

    /// Render one pair in the current mode.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(mode = %self.mode)))]
    pub fn render(&mut self, frames: &FramePair) -> Result<PreviewFrame, PreviewError> {
        self.check()?;
        let mut out = PreviewFrame {
            mode: self.mode,
            views: Vec::new(),
            overlap: None,
            depth: None,
        };

        if self.mode == PreviewMode::Raw {
            out.views = vec![
                view("left", frames.left.clone()),
                view("right", frames.right.clone()),
            ];
            return Ok(self.finish(out));
        }
        let Some(rect) = self.rectification.as_ref() else {
            return Err(PreviewError::MissingRectification(self.mode));
        };

        let rectified = rect.pipeline.apply(frames)?;
        out.overlap = rect.overlap.overlap();

        match self.mode {
            PreviewMode::Raw => {}
            PreviewMode::Rectified => {
                let FramePair {
                    mut left,
                    mut right,
                } = rectified;
                for (side, image) in [(Side::Left, &mut left), (Side::Right, &mut right)] {
                    draw_rect(image, &rect.pipeline.roi(side), ROI_BLUE, 2);
                    if let Some(roi) = out.overlap {
                        draw_rect(image, &roi, OVERLAP_GREEN, 2);
                    }
                }
                out.views = vec![view("left", left), view("right", right)];
            }
            PreviewMode::Overlap | PreviewMode::Anaglyph | PreviewMode::Depth => {
                let Some(cropped) = rect.overlap.extract(&rectified) else {
                    log::trace!("no overlap to show");
                    return Ok(out);
                };
                match self.mode {
                    PreviewMode::Overlap => {
                        out.views = vec![view("left", cropped.left), view("right", cropped.right)];
                    }
                    PreviewMode::Anaglyph => {
                        out.views = vec![view("anaglyph", anaglyph(&cropped.left, &cropped.right))];
                    }
                    _ => {
                        if let Some(estimator) = self.depth.as_mut() {
                            let estimate = estimator.estimate(&cropped.left, &cropped.right)?;
                            out.depth = estimate.bounds;
                            if let Some(color) = estimate.colorized() {
                                out.views = vec![view("depth", color)];
                            }
                        }
                    }
                }
            }
        }
        Ok(self.finish(out))
    }

    fn finish(&self, mut frame: PreviewFrame) -> PreviewFrame {
        for v in &mut frame.views {
            draw_guides(&mut v.image, self.guide_lines, GUIDE_GREEN);
        }
        frame
    }

    /// Run until `Abort` arrives or the command channel closes.
    ///
    /// The source is attached for the duration and detached on every exit.
    /// Each cycle ends by waiting up to the poll interval for a command.
    /// Per-frame failures are logged and counted; only source errors that are
    /// not transient end the loop with an error.
    pub fn run<S, K>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        commands: &Receiver<Command>,
    ) -> Result<PreviewStats, PreviewError>
    where
        S: FrameSource + ?Sized,
        K: PreviewSink + ?Sized,
    {
        self.check()?;
        let mut stats = PreviewStats::default();
        let mut source = AttachGuard::attach(source)?;
        log::info!("{} preview started", self.mode);

        loop {
            match source.read() {
                Ok(frames) => match self.render(&frames) {
                    Ok(frame) => {
                        sink.show(&frame);
                        stats.shown += 1;
                    }
                    Err(e) => {
                        stats.failed += 1;
                        log::error!("{} preview frame failed: {e}", self.mode);
                    }
                },
                Err(e) if e.is_transient() => {
                    stats.dropped += 1;
                    log::debug!("frame dropped: {e}");
                }
                Err(e) => return Err(e.into()),
            }

            match commands.recv_timeout(self.poll_interval) {
                Ok(Command::Abort) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(_) | Err(RecvTimeoutError::Timeout) => {}
            }
        }

        drop(source);
        log::info!(
            "{} preview stopped ({} shown, {} dropped, {} failed)",
            self.mode,
            stats.shown,
            stats.dropped,
            stats.failed
        );
        Ok(stats)
    }
}

fn view(title: &'static str, image: Image) -> PreviewView {
    PreviewView { title, image }
}
