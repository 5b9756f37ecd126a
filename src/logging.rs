//! Logging setup.
//!
//! Installs a `tracing-subscriber` registry with a reloadable level filter, a
//! console layer and a non-blocking rolling file layer. The returned
//! [`LogHandle`] switches between debug and info level at runtime and keeps
//! the file writer alive; drop it last.

use std::path::PathBuf;

use tracing::{Subscriber, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Registry, fmt, reload};

use crate::error::DeskfigError;
use crate::schema::Settings;

/// What to log and where.
#[derive(Debug, Clone, PartialEq)]
pub struct LogOptions {
    /// Directory for log files. `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    /// Log file name prefix, usually the app name.
    pub file_prefix: String,
    pub debug: bool,
    /// Rotation interval as stored in settings (`"1 day"`, `"1 hour"`, ...).
    pub rotation: String,
    /// Days of rotated logs to keep. Zero or less keeps everything.
    pub retention_days: i64,
    pub console: bool,
}

impl LogOptions {
    pub fn new(file_prefix: impl Into<String>) -> Self {
        Self {
            log_dir: None,
            file_prefix: file_prefix.into(),
            debug: false,
            rotation: "1 day".to_string(),
            retention_days: 7,
            console: true,
        }
    }

    /// Options matching the logging settings of a loaded application.
    pub fn from_settings(settings: &Settings, log_dir: impl Into<PathBuf>, app: &str) -> Self {
        Self {
            log_dir: Some(log_dir.into()),
            file_prefix: app.to_string(),
            debug: settings.debug_mode,
            rotation: settings.log_rotation.clone(),
            retention_days: settings.log_retention_days,
            console: true,
        }
    }
}

/// Runtime control over an installed subscriber.
pub struct LogHandle {
    level: reload::Handle<LevelFilter, Registry>,
    _guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("level", &self.level())
            .finish()
    }
}

impl LogHandle {
    /// Switch between debug and info level.
    pub fn set_debug(&self, debug: bool) -> Result<(), DeskfigError> {
        self.level
            .reload(level_for(debug))
            .map_err(|e| DeskfigError::Logging(e.to_string()))
    }

    pub fn level(&self) -> Option<LevelFilter> {
        self.level.clone_current()
    }
}

pub fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Parse a rotation interval. Returns `None` for intervals the appender
/// can't express.
pub fn parse_rotation(interval: &str) -> Option<Rotation> {
    match interval.trim().to_ascii_lowercase().as_str() {
        "1 day" | "day" | "daily" => Some(Rotation::DAILY),
        "1 hour" | "hour" | "hourly" => Some(Rotation::HOURLY),
        "1 minute" | "minute" | "minutely" => Some(Rotation::MINUTELY),
        "never" => Some(Rotation::NEVER),
        _ => None,
    }
}

/// Number of files covering `retention_days` at the given rotation.
fn max_log_files(rotation: &Rotation, retention_days: i64) -> Option<usize> {
    let days = usize::try_from(retention_days).ok().filter(|d| *d > 0)?;
    let per_day = if *rotation == Rotation::HOURLY {
        24
    } else if *rotation == Rotation::MINUTELY {
        24 * 60
    } else if *rotation == Rotation::NEVER {
        return None;
    } else {
        1
    };
    Some(days * per_day)
}

/// Build the subscriber without installing it.
pub fn subscriber(
    options: &LogOptions,
) -> Result<(Box<dyn Subscriber + Send + Sync>, LogHandle), DeskfigError> {
    let (level_layer, level) = reload::Layer::new(level_for(options.debug));

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            let rotation = parse_rotation(&options.rotation).unwrap_or_else(|| {
                warn!(rotation = %options.rotation, "unsupported log rotation, rotating daily");
                Rotation::DAILY
            });

            std::fs::create_dir_all(dir).map_err(|e| DeskfigError::Io {
                path: dir.clone(),
                source: e,
            })?;

            let mut builder = RollingFileAppender::builder()
                .rotation(rotation.clone())
                .filename_prefix(options.file_prefix.as_str())
                .filename_suffix("log");
            if let Some(max) = max_log_files(&rotation, options.retention_days) {
                builder = builder.max_log_files(max);
            }
            let appender = builder
                .build(dir)
                .map_err(|e| DeskfigError::Logging(e.to_string()))?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::Layer::default()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = options.console.then(|| {
        fmt::Layer::default()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let subscriber = tracing_subscriber::registry()
        .with(level_layer)
        .with(file_layer)
        .with(console_layer);

    Ok((
        Box::new(subscriber),
        LogHandle {
            level,
            _guard: guard,
        },
    ))
}

/// Build the subscriber and install it as the global default.
pub fn init(options: &LogOptions) -> Result<LogHandle, DeskfigError> {
    let (subscriber, handle) = subscriber(options)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| DeskfigError::Logging(e.to_string()))?;
    Ok(handle)
}
