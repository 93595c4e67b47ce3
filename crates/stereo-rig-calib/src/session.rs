use crate::{
    BoardSpec, CalibrationExporter, CalibrationSampleSet, CalibrationSolver, CaptureFeedback,
    CaptureObserver, Command, NoopObserver, PatternDetector, SolveOptions, SolverError,
    StereoCalibration,
};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use stereo_rig_core::{CalibrationFileError, Image};
use std::time::Duration;
use stereo_rig_source::{AttachGuard, FrameSource, SourceError};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("no calibration samples were collected")]
    NoSamples,
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("failed to export calibration: {0}")]
    Export(#[from] CalibrationFileError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Accepted samples after which capture stops on its own.
    pub target_count: usize,
    /// Longest wait for an operator command per cycle.
    pub poll_interval_ms: u64,
    pub board: BoardSpec,
    pub solve: SolveOptions,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_count: 128,
            poll_interval_ms: 1,
            board: BoardSpec::default(),
            solve: SolveOptions::default(),
        }
    }
}

impl CaptureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The target sample count was reached.
    Complete,
    /// The operator stopped early.
    Aborted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureOutcome {
    pub samples: CalibrationSampleSet,
    pub completion: Completion,
    /// Cycles dropped because the source failed to deliver a pair.
    pub skipped_frames: usize,
    /// Accept commands ignored because a side lacked the pattern.
    pub rejected_accepts: usize,
}

impl CaptureOutcome {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub outcome: CaptureOutcome,
    /// `None` when capture ended without a single sample.
    pub calibration: Option<StereoCalibration>,
}

/// Interactive stereo calibration: capture correspondences, solve, export.
pub struct CalibrationSession<D, O = NoopObserver> {
    detector: D,
    observer: O,
    config: CaptureConfig,
    template: Vec<Point3<f32>>,
}

impl<D: PatternDetector> CalibrationSession<D> {
    pub fn new(detector: D, config: CaptureConfig) -> Self {
        let template = config.board.object_points();
        Self {
            detector,
            observer: NoopObserver,
            config,
            template,
        }
    }
}

impl<D: PatternDetector, O: CaptureObserver> CalibrationSession<D, O> {
    pub fn with_observer<O2: CaptureObserver>(self, observer: O2) -> CalibrationSession<D, O2> {
        CalibrationSession {
            detector: self.detector,
            observer,
            config: self.config,
            template: self.template,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Capture until the target count is reached or `Abort` arrives.
    ///
    /// The source is attached for the duration of the call and detached on
    /// every exit path. Each cycle waits up to the poll interval for one
    /// command; a cycle without a command counts as `Continue`, and a
    /// disconnected channel as `Abort`. Transient read failures skip the cycle.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(target_count = self.config.target_count))
    )]
    pub fn capture<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        commands: &Receiver<Command>,
    ) -> Result<CaptureOutcome, SessionError> {
        let target = self.config.target_count;
        let poll = self.config.poll_interval();
        let pattern = self.config.board.pattern();
        let mut samples = CalibrationSampleSet::new(self.template.clone());
        let mut skipped_frames = 0;
        let mut rejected_accepts = 0;

        let mut source = AttachGuard::attach(source)?;
        log::info!("calibration capture started ({target} samples, board {pattern})");

        let completion = loop {
            if samples.len() >= target {
                break Completion::Complete;
            }

            let frame = source.read();
            let command = next_command(commands, poll);

            let pair = match frame {
                Ok(pair) => pair,
                Err(e) if e.is_transient() => {
                    skipped_frames += 1;
                    log::debug!("frame skipped: {e}");
                    if command == Command::Abort {
                        break Completion::Aborted;
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let left = self.find_corners(&pair.left, pattern);
            let right = self.find_corners(&pair.right, pattern);
            self.observer.on_frame(&CaptureFeedback {
                frames: &pair,
                left_corners: left.as_deref(),
                right_corners: right.as_deref(),
                accepted: samples.len(),
                target,
            });

            match command {
                Command::Abort => break Completion::Aborted,
                Command::Continue => {}
                Command::Accept => {
                    let (left_found, right_found) = (left.is_some(), right.is_some());
                    let pushed = match (left, right, pair.size()) {
                        (Some(l), Some(r), Some(size)) => samples.push(size, l, r).map_err(|e| {
                            log::warn!("sample rejected: {e}");
                        }),
                        _ => {
                            log::warn!(
                                "pattern not recognized on both sides (left: {left_found}, right: {right_found}); sample rejected"
                            );
                            Err(())
                        }
                    };
                    match pushed {
                        Ok(count) => {
                            log::info!("sample {count}/{target} accepted");
                            self.observer.on_accept(count, target);
                        }
                        Err(()) => {
                            rejected_accepts += 1;
                            self.observer.on_reject(left_found, right_found);
                        }
                    }
                }
            }
        };

        drop(source);
        match completion {
            Completion::Complete => log::info!("capture complete: {} samples", samples.len()),
            Completion::Aborted => log::info!(
                "capture aborted with {}/{target} samples",
                samples.len()
            ),
        }
        Ok(CaptureOutcome {
            samples,
            completion,
            skipped_frames,
            rejected_accepts,
        })
    }

    /// Solve from `samples` and export the resulting parameters.
    ///
    /// A set shorter than the target only warns; an empty set is an error.
    pub fn calibrate<C, E>(
        &self,
        samples: &CalibrationSampleSet,
        solver: &C,
        exporter: &E,
    ) -> Result<StereoCalibration, SessionError>
    where
        C: CalibrationSolver + ?Sized,
        E: CalibrationExporter + ?Sized,
    {
        if samples.is_empty() {
            return Err(SessionError::NoSamples);
        }
        if samples.len() < self.config.target_count {
            log::warn!(
                "calibrating with {} samples, fewer than the target of {}",
                samples.len(),
                self.config.target_count
            );
        }
        let result = solver.solve(samples, &self.config.solve)?;
        log::info!(
            "stereo calibration done, reprojection error {:.4} px",
            result.reprojection_error
        );
        exporter.export(&result.params)?;
        Ok(result)
    }

    /// Capture, then calibrate with whatever was collected.
    pub fn run<S, C, E>(
        &mut self,
        source: &mut S,
        commands: &Receiver<Command>,
        solver: &C,
        exporter: &E,
    ) -> Result<SessionReport, SessionError>
    where
        S: FrameSource + ?Sized,
        C: CalibrationSolver + ?Sized,
        E: CalibrationExporter + ?Sized,
    {
        let outcome = self.capture(source, commands)?;
        if outcome.samples.is_empty() {
            log::warn!("no samples collected; skipping calibration");
            return Ok(SessionReport {
                outcome,
                calibration: None,
            });
        }
        let calibration = self.calibrate(&outcome.samples, solver, exporter)?;
        Ok(SessionReport {
            outcome,
            calibration: Some(calibration),
        })
    }

    fn find_corners(
        &mut self,
        image: &Image,
        pattern: crate::PatternSize,
    ) -> Option<Vec<Point2<f32>>> {
        let corners = self.detector.detect(&image.to_gray(), pattern)?;
        if corners.len() != self.template.len() {
            log::debug!(
                "detector returned {} corners for a {pattern} board",
                corners.len()
            );
            return None;
        }
        Some(corners)
    }
}

fn next_command(commands: &Receiver<Command>, poll: Duration) -> Command {
    match commands.recv_timeout(poll) {
        Ok(command) => command,
        Err(RecvTimeoutError::Timeout) => Command::Continue,
        Err(RecvTimeoutError::Disconnected) => Command::Abort,
    }
}
