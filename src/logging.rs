use crate::error::ServerError;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// An `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub filter: String,
    /// Also append logs to this file, without colors.
    pub log_file: Option<PathBuf>,
    pub with_target: bool,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            log_file: None,
            with_target: false,
        }
    }
}
impl LogConfig {
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

fn log_error(msg: String) -> ServerError {
    ServerError::Runtime(msg)
}

/// Installs the global `tracing` subscriber: stdout, plus the log file when configured.
///
/// Keep the returned guard alive until exit.  Dropping it flushes and closes the log file.
///
/// # Errors
/// Returns an error when:
/// - the filter directive is invalid
/// - we fail to create the log file or its directory
/// - a global subscriber is already installed
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| log_error(format!("invalid log filter {:?}: {e}", config.filter)))?;
    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .ok_or_else(|| log_error(format!("log file path has no file name: {path:?}")))?;
            std::fs::create_dir_all(dir)
                .map_err(|e| log_error(format!("error creating log dir {dir:?}: {e}")))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name)
                .build(dir)
                .map_err(|e| log_error(format!("error opening log file {path:?}: {e}")))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(config.with_target)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .with(file_layer)
        .try_init()
        .map_err(|e| log_error(format!("error installing logger: {e}")))?;
    Ok(guard)
}
