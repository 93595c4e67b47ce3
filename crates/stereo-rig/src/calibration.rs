use crate::CalibrationConfig;
use crossbeam_channel::Receiver;
use stereo_rig_calib::{
    CalibrationSession, CalibrationSolver, CaptureObserver, Command, PatternDetector,
    SessionError, SessionReport,
};
use stereo_rig_source::FrameSource;

/// Capture samples from `source`, solve and write the archive to
/// `config.output_path`.
pub fn run_calibration<S, D, O, C>(
    config: &CalibrationConfig,
    source: &mut S,
    detector: D,
    observer: O,
    solver: &C,
    commands: &Receiver<Command>,
) -> Result<SessionReport, SessionError>
where
    S: FrameSource + ?Sized,
    D: PatternDetector,
    O: CaptureObserver,
    C: CalibrationSolver + ?Sized,
{
    let exporter = config.exporter();
    log::info!(
        "calibrating into {} ({} samples requested)",
        exporter.path().display(),
        config.capture.target_count
    );
    let mut session = CalibrationSession::new(detector, config.capture.clone()).with_observer(observer);
    session.run(source, commands, solver, &exporter)
}
