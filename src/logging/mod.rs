/*!
 * Logging Module
 * Centralized logging configuration and utilities
 */
pub mod config;
pub mod middleware;

pub use config::{LogLevel, LogSettings};

use std::io;
use tracing::Subscriber;
use tracing_appender::{
    non_blocking,
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};

/// Background writer guards. Dropping them flushes and stops the log writers,
/// so hold them for the lifetime of the process.
#[must_use]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// JSON lines at ERROR only, in every environment
fn error_file_layer<S>(writer: NonBlocking) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::ERROR)
}

/// Initialize the logging system
pub fn init(settings: &LogSettings) -> LogGuards {
    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&settings.directory).ok();

    // File appender for all logs
    let file_appender = rolling::daily(&settings.directory, "app.log");
    let (file_writer, file_guard) = non_blocking(file_appender);

    // File appender for errors only
    let error_appender = rolling::daily(&settings.directory, "error.log");
    let (error_writer, error_guard) = non_blocking(error_appender);

    // Console writer
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.filter_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if settings.is_production() {
        // JSON format for production
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_file_layer(error_writer))
            .with(console_layer)
            .try_init()
            .ok();
    } else {
        // Pretty format for development
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_file_layer(error_writer))
            .with(console_layer)
            .try_init()
            .ok();
    }

    tracing::info!(
        environment = %settings.environment,
        level = %settings.level,
        "logging initialized"
    );

    LogGuards {
        _guards: vec![file_guard, error_guard, console_guard],
    }
}
