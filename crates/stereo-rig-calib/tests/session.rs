use approx::assert_relative_eq;
use crossbeam_channel::unbounded;
use nalgebra::{Matrix3, Point2, Vector3};
use std::cell::Cell;
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};
use stereo_rig_calib::{
    BoardSpec, CalibrationSampleSet, CalibrationSession, CalibrationSolver, CaptureConfig,
    CaptureFeedback, CaptureObserver, Command, Completion, PatternDetector, PatternSize,
    SessionError, SolveOptions, SolverError, StereoCalibration,
};
use stereo_rig_core::{
    CalibrationFile, CalibrationParameters, FramePair, Image, ImageSize, PixelFormat,
};
use stereo_rig_source::{DeviceError, FrameSource, SourceError, SourceState};
use tempfile::tempdir;

const W: usize = 8;
const H: usize = 6;

fn view(visible: bool) -> Image {
    let mut img = Image::zeros(W, H, PixelFormat::Bgr8);
    img.data.fill(visible as u8);
    img
}

fn pair(left: bool, right: bool) -> Result<FramePair, SourceError> {
    Ok(FramePair::new(view(left), view(right)))
}

fn dropped() -> Result<FramePair, SourceError> {
    Err(SourceError::ReadFailed {
        device: "fake".into(),
        source: DeviceError::Disconnected,
    })
}

#[derive(Default)]
struct ScriptedSource {
    frames: VecDeque<Result<FramePair, SourceError>>,
    attached: bool,
    fail_attach: bool,
    attaches: usize,
    detaches: usize,
}

impl ScriptedSource {
    fn new(frames: impl IntoIterator<Item = Result<FramePair, SourceError>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl FrameSource for ScriptedSource {
    fn attach(&mut self) -> Result<(), SourceError> {
        if self.fail_attach {
            return Err(SourceError::NotEnoughDevices {
                found: 1,
                required: 2,
            });
        }
        self.attaches += 1;
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) {
        if self.attached {
            self.detaches += 1;
        }
        self.attached = false;
    }

    fn read(&mut self) -> Result<FramePair, SourceError> {
        self.frames.pop_front().unwrap_or_else(dropped)
    }

    fn state(&self) -> SourceState {
        if self.attached {
            SourceState::Attached
        } else {
            SourceState::Detached
        }
    }

    fn frame_size(&self) -> Option<ImageSize> {
        self.attached.then_some(ImageSize::new(W, H))
    }
}

/// Reports the full board whenever the first pixel is lit.
struct LitDetector;

impl PatternDetector for LitDetector {
    fn detect(&mut self, gray: &Image, pattern: PatternSize) -> Option<Vec<Point2<f32>>> {
        assert_eq!(gray.format, PixelFormat::Gray8);
        (gray.data[0] > 0).then(|| {
            (0..pattern.corner_count())
                .map(|i| Point2::new(i as f32, 1.0))
                .collect()
        })
    }
}

fn session(target: usize) -> CalibrationSession<LitDetector> {
    CalibrationSession::new(
        LitDetector,
        CaptureConfig {
            target_count: target,
            board: BoardSpec {
                cols: 3,
                rows: 2,
                square_size: 0.03,
            },
            ..CaptureConfig::default()
        },
    )
}

fn commands(cmds: &[Command]) -> crossbeam_channel::Receiver<Command> {
    let (tx, rx) = unbounded();
    for c in cmds {
        tx.send(*c).expect("send");
    }
    rx
}

fn params() -> CalibrationParameters {
    let k = Matrix3::new(
        600.0, 0.0, 4.0, //
        0.0, 600.0, 3.0, //
        0.0, 0.0, 1.0,
    );
    CalibrationParameters {
        intrinsics_left: k,
        distortion_left: vec![0.0; 5],
        intrinsics_right: k,
        distortion_right: vec![0.0; 5],
        rotation: Matrix3::identity(),
        translation: Vector3::new(-0.06, 0.0, 0.0),
    }
}

struct FakeSolver {
    calls: Cell<usize>,
    fail: bool,
}

impl FakeSolver {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
            fail: false,
        }
    }
}

impl CalibrationSolver for FakeSolver {
    fn solve(
        &self,
        samples: &CalibrationSampleSet,
        options: &SolveOptions,
    ) -> Result<StereoCalibration, SolverError> {
        self.calls.set(self.calls.get() + 1);
        assert_eq!(options, &SolveOptions::default());
        assert_eq!(samples.image_size(), Some(ImageSize::new(W, H)));
        if self.fail {
            return Err(SolverError::new("degenerate sample set"));
        }
        Ok(StereoCalibration {
            params: params(),
            reprojection_error: 0.25,
        })
    }
}

#[test]
fn capture_completes_at_target() {
    let mut source = ScriptedSource::new([pair(true, true), pair(true, true), pair(true, true)]);
    let rx = commands(&[Command::Accept, Command::Accept, Command::Accept]);

    let outcome = session(2).capture(&mut source, &rx).expect("capture");

    assert_eq!(outcome.completion, Completion::Complete);
    assert_eq!(outcome.samples.len(), 2);
    assert_eq!(outcome.samples.object_points().len(), 6);
    assert!(outcome
        .samples
        .samples()
        .iter()
        .all(|s| s.left.len() == 6 && s.right.len() == 6));
    // the third frame is never read
    assert_eq!(source.frames.len(), 1);
    assert_eq!((source.attaches, source.detaches), (1, 1));
    assert_eq!(source.state(), SourceState::Detached);
}

#[test]
fn accept_with_one_side_missing_is_rejected() {
    let mut source = ScriptedSource::new([pair(true, false), pair(false, true), pair(true, true)]);
    let rx = commands(&[Command::Accept, Command::Accept, Command::Accept]);

    let outcome = session(5).capture(&mut source, &rx).expect("capture");

    assert_eq!(outcome.samples.len(), 1);
    assert_eq!(outcome.rejected_accepts, 2);
}

#[test]
fn abort_returns_partial_set() {
    let mut source = ScriptedSource::new([pair(true, true), pair(true, true), pair(true, true)]);
    let rx = commands(&[Command::Accept, Command::Abort, Command::Accept]);

    let outcome = session(128).capture(&mut source, &rx).expect("capture");

    assert_eq!(outcome.completion, Completion::Aborted);
    assert!(!outcome.is_complete());
    assert_eq!(outcome.samples.len(), 1);
    assert_eq!(source.detaches, 1);
}

#[test]
fn closed_command_channel_aborts() {
    let mut source = ScriptedSource::new([pair(true, true), pair(true, true)]);
    let (tx, rx) = unbounded();
    tx.send(Command::Continue).expect("send");
    drop(tx);

    let outcome = session(10).capture(&mut source, &rx).expect("capture");

    assert_eq!(outcome.completion, Completion::Aborted);
    assert!(outcome.samples.is_empty());
    assert_eq!(source.frames.len(), 0);
}

#[test]
fn transient_read_failures_are_skipped() {
    let mut source = ScriptedSource::new([dropped(), pair(true, true), dropped(), pair(true, true)]);
    let rx = commands(&[
        Command::Accept,
        Command::Accept,
        Command::Accept,
        Command::Accept,
    ]);

    let outcome = session(2).capture(&mut source, &rx).expect("capture");

    assert!(outcome.is_complete());
    assert_eq!(outcome.skipped_frames, 2);
    assert_eq!(outcome.rejected_accepts, 0);
}

#[test]
fn failing_source_is_polled_at_the_command_interval() {
    let mut source = ScriptedSource::new([]);
    let (tx, rx) = unbounded();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(60));
        tx.send(Command::Abort).expect("send");
    });
    let mut session = CalibrationSession::new(
        LitDetector,
        CaptureConfig {
            poll_interval_ms: 5,
            ..CaptureConfig::default()
        },
    );

    let started = Instant::now();
    let outcome = session.capture(&mut source, &rx).expect("capture");
    let elapsed = started.elapsed();
    stopper.join().expect("stopper");

    assert_eq!(outcome.completion, Completion::Aborted);
    // every cycle waits the full interval before the abort arrives
    let cycles = (elapsed.as_millis() / 5) as usize + 1;
    assert!(outcome.skipped_frames >= 1);
    assert!(
        outcome.skipped_frames <= cycles,
        "{} reads in {elapsed:?}",
        outcome.skipped_frames
    );
}

#[test]
fn fatal_read_error_detaches_and_propagates() {
    let mut source = ScriptedSource::new([pair(true, true), Err(SourceError::NotAttached)]);
    let (_tx, rx) = unbounded();

    let err = session(3).capture(&mut source, &rx).unwrap_err();

    assert!(matches!(err, SessionError::Source(SourceError::NotAttached)));
    assert_eq!(source.detaches, 1);
}

#[test]
fn attach_failure_is_reported() {
    let mut source = ScriptedSource {
        fail_attach: true,
        ..ScriptedSource::default()
    };
    let (_tx, rx) = unbounded();
    let err = session(3).capture(&mut source, &rx).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Source(SourceError::NotEnoughDevices { .. })
    ));
}

#[derive(Default)]
struct Progress {
    frames: usize,
    both_found: usize,
    accepted: Vec<(usize, usize)>,
    rejected: Vec<(bool, bool)>,
}

impl CaptureObserver for Progress {
    fn on_frame(&mut self, feedback: &CaptureFeedback<'_>) {
        self.frames += 1;
        if feedback.both_found() {
            self.both_found += 1;
        }
    }

    fn on_accept(&mut self, accepted: usize, target: usize) {
        self.accepted.push((accepted, target));
    }

    fn on_reject(&mut self, left_found: bool, right_found: bool) {
        self.rejected.push((left_found, right_found));
    }
}

#[test]
fn observer_sees_every_frame_and_decision() {
    let mut source = ScriptedSource::new([pair(true, true), pair(false, true), pair(true, true)]);
    let rx = commands(&[Command::Continue, Command::Accept, Command::Accept]);

    let mut session = session(1).with_observer(Progress::default());
    session.capture(&mut source, &rx).expect("capture");

    let progress = session.observer();
    assert_eq!(progress.frames, 3);
    assert_eq!(progress.both_found, 2);
    assert_eq!(progress.rejected, vec![(false, true)]);
    assert_eq!(progress.accepted, vec![(1, 1)]);
}

#[test]
fn run_calibrates_and_exports_short_sets() {
    let dir = tempdir().expect("tempdir");
    let file = CalibrationFile::new(dir.path().join("calibration.json"));
    let mut source = ScriptedSource::new([pair(true, true), pair(true, true)]);
    let rx = commands(&[Command::Accept, Command::Abort]);
    let solver = FakeSolver::new();

    let report = session(4)
        .run(&mut source, &rx, &solver, &file)
        .expect("run");

    assert_eq!(report.outcome.completion, Completion::Aborted);
    assert_eq!(solver.calls.get(), 1);
    let calibration = report.calibration.expect("calibration");
    assert_eq!(calibration.reprojection_error, 0.25);
    let loaded = file.load().expect("load");
    assert_relative_eq!(loaded.translation, params().translation, epsilon = 1e-12);
    assert_relative_eq!(loaded.intrinsics_left, params().intrinsics_left, epsilon = 1e-9);
}

#[test]
fn run_without_samples_skips_solver() {
    let dir = tempdir().expect("tempdir");
    let file = CalibrationFile::new(dir.path().join("calibration.json"));
    let mut source = ScriptedSource::new([pair(true, true)]);
    let rx = commands(&[Command::Abort]);
    let solver = FakeSolver::new();

    let report = session(4)
        .run(&mut source, &rx, &solver, &file)
        .expect("run");

    assert!(report.calibration.is_none());
    assert_eq!(solver.calls.get(), 0);
    assert!(!file.path().exists());
}

#[test]
fn calibrate_rejects_empty_set_and_propagates_solver_failure() {
    let dir = tempdir().expect("tempdir");
    let file = CalibrationFile::new(dir.path().join("calibration.json"));
    let session = session(2);

    let empty = CalibrationSampleSet::new(session.config().board.object_points());
    assert!(matches!(
        session.calibrate(&empty, &FakeSolver::new(), &file),
        Err(SessionError::NoSamples)
    ));

    let mut set = CalibrationSampleSet::new(session.config().board.object_points());
    let corners: Vec<_> = (0..6).map(|i| Point2::new(i as f32, 0.0)).collect();
    set.push(ImageSize::new(W, H), corners.clone(), corners)
        .expect("push");
    let failing = FakeSolver {
        calls: Cell::new(0),
        fail: true,
    };
    assert!(matches!(
        session.calibrate(&set, &failing, &file),
        Err(SessionError::Solver(_))
    ));
    assert!(!file.path().exists());
}
