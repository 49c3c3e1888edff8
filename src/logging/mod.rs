// Logging setup - tracing subscriber with optional rotating JSON file output
//
// Human-readable logs go to stderr so command output on stdout (rendered
// markup, listings) stays pipeable. File logging writes structured JSON
// through a non-blocking appender.
//
// Precedence: RUST_LOG env var > config file > default "info"

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogRotation, LoggingConfig};

/// Filter directive used when RUST_LOG is unset
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("viki_ui={},tower_http=info,axum=info", config.level)
}

fn file_appender(config: &LoggingConfig) -> RollingFileAppender {
    let dir = &config.file_dir;
    let prefix = &config.file_prefix;
    match config.file_rotation {
        LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
        LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
        LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the life of the program.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(config).into());
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if config.file_enabled {
        if let Err(e) = std::fs::create_dir_all(&config.file_dir) {
            eprintln!(
                "Warning: Could not create log directory {:?}: {}",
                config.file_dir, e
            );
        } else {
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config));
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::registry().with(filter).with(stderr).init();
    None
}
