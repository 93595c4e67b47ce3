//! Process-wide log output for preview and calibration runs.
//!
//! Library crates only emit through `log` (and `tracing` spans with the
//! `tracing` feature). [`init_logging`] installs the sink: an elapsed-time
//! stderr logger by default, or a `tracing-subscriber` fmt subscriber that
//! also receives `log` records when the `tracing` feature is on.

use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("unknown log level `{0}`")]
    InvalidLevel(String),
    #[error(transparent)]
    AlreadySet(#[from] log::SetLoggerError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// `[  1.234s  INFO target] message`
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, LoggingError> {
        self.level
            .parse()
            .map_err(|_| LoggingError::InvalidLevel(self.level.clone()))
    }
}

#[cfg(not(feature = "tracing"))]
mod stderr {
    use super::LogFormat;
    use log::{LevelFilter, Log, Metadata, Record};
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    pub(super) struct StderrLogger {
        level: LevelFilter,
        format: LogFormat,
        started: Instant,
    }

    impl StderrLogger {
        pub(super) fn line(&self, record: &Record) -> String {
            let elapsed = self.started.elapsed().as_secs_f64();
            match self.format {
                LogFormat::Plain => format!(
                    "[{:7.3}s {:>5} {}] {}",
                    elapsed,
                    record.level(),
                    record.target(),
                    record.args()
                ),
                LogFormat::Json => serde_json::json!({
                    "elapsed": elapsed,
                    "level": record.level().as_str(),
                    "target": record.target(),
                    "message": record.args().to_string(),
                })
                .to_string(),
            }
        }
    }

    impl Log for StderrLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= self.level
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                let _ = writeln!(std::io::stderr(), "{}", self.line(record));
            }
        }

        fn flush(&self) {}
    }

    static INSTALLED: AtomicBool = AtomicBool::new(false);

    pub(super) fn new(level: LevelFilter, format: LogFormat) -> StderrLogger {
        StderrLogger {
            level,
            format,
            started: Instant::now(),
        }
    }

    pub(super) fn install(level: LevelFilter, format: LogFormat) -> Result<(), log::SetLoggerError> {
        if INSTALLED.load(Ordering::Acquire) {
            return Ok(());
        }
        log::set_boxed_logger(Box::new(new(level, format)))?;
        log::set_max_level(level);
        INSTALLED.store(true, Ordering::Release);
        Ok(())
    }
}

/// Install the global log sink described by `config`.
///
/// Repeated calls after a successful install are no-ops. Fails if another
/// logger was installed by someone else first.
#[cfg(not(feature = "tracing"))]
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let level = config.level_filter()?;
    stderr::install(level, config.format)?;
    Ok(())
}

/// Install a `tracing-subscriber` fmt subscriber and route `log` records
/// into it.
///
/// `RUST_LOG` overrides `config.level` when set. Repeated calls are no-ops.
#[cfg(feature = "tracing")]
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let level = config.level_filter()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    let _ = tracing_log::LogTracer::init();
    match config.format {
        LogFormat::Json => {
            let _ = fmt()
                .with_env_filter(filter)
                .with_span_events(FmtSpan::CLOSE)
                .json()
                .flatten_event(true)
                .finish()
                .try_init();
        }
        LogFormat::Plain => {
            let _ = fmt()
                .with_env_filter(filter)
                .with_span_events(FmtSpan::CLOSE)
                .with_timer(fmt::time::Uptime::default())
                .finish()
                .try_init();
        }
    }
    Ok(())
}
