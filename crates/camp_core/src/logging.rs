//! Rolling file logs for processes embedding the contacts core.
//!
//! Settings come from [`CampConfig`]: `log_level` picks the default filter and
//! `log_dir` the directory holding `camp*.log`. A config without `log_dir`
//! leaves logging off.
//!
//! One logger exists per process. Repeating `init_logging` with the same
//! settings is a no-op; asking for different settings afterwards is an error.
//! Nothing here panics.

use crate::config::CampConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "camp";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_SUMMARY_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Why the rolling logger could not be started.
#[derive(Debug)]
pub enum LoggingError {
    /// `log_level` is not one of `off|error|warn|info|debug|trace`.
    UnknownLevel(String),
    /// `log_dir` must be absolute so the target does not depend on cwd.
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A logger with other settings is already running.
    AlreadyActive { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(f, "unknown log level `{level}`"),
            Self::RelativeDir(dir) => {
                write!(f, "log directory must be absolute: `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "log backend failed to start: {err}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active with {active}; cannot switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: LevelFilter,
    dir: PathBuf,
}

impl LogSettings {
    /// `Ok(None)` when the config does not ask for file logging.
    fn from_config(config: &CampConfig) -> Result<Option<Self>, LoggingError> {
        let Some(dir) = config.log_dir.as_deref() else {
            return Ok(None);
        };
        let level = config
            .log_level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|_| LoggingError::UnknownLevel(config.log_level.clone()))?;
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDir(dir.to_path_buf()));
        }

        Ok(Some(Self {
            level,
            dir: dir.to_path_buf(),
        }))
    }

    fn describe(&self) -> String {
        format!("level={} dir={}", self.level, self.dir.display())
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts the rolling file logger described by `config`.
///
/// Returns `Ok(false)` when `config.log_dir` is unset and `Ok(true)` once a
/// logger with these settings is running.
pub fn init_logging(config: &CampConfig) -> Result<bool, LoggingError> {
    let Some(settings) = LogSettings::from_config(config)? else {
        return Ok(false);
    };

    let active = ACTIVE.get_or_try_init(|| start_logger(settings.clone()))?;
    if active.settings != settings {
        return Err(LoggingError::AlreadyActive {
            active: active.settings.describe(),
            requested: settings.describe(),
        });
    }
    Ok(true)
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(settings: LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::with(LogSpecification::builder().default(settings.level).build())
        .log_to_file(file_spec(&settings.dir))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    PANIC_HOOK.get_or_init(install_panic_hook);
    info!(
        "event=logging_init module=core status=ok level={} log_dir={} version={}",
        settings.level,
        settings.dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn file_spec(dir: &Path) -> FileSpec {
    FileSpec::default().directory(dir).basename(LOG_BASENAME)
}

fn install_panic_hook() {
    let next = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            panic_summary(info.payload())
        );
        next(info);
    }));
}

/// One-line, length-capped rendering of a panic payload.
///
/// Payloads can quote contact data, so only a short prefix reaches the log.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");

    let mut summary: String = text
        .chars()
        .take(PANIC_SUMMARY_LIMIT)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    if text.chars().count() > PANIC_SUMMARY_LIMIT {
        summary.push_str("...");
    }
    summary
}
