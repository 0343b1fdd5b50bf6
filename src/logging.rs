//! Thin configuration facade over the `tracing` ecosystem.
//!
//! The queues never log from their hot paths; this module exists so that
//! binaries embedding the crate can stand up a sensible global subscriber
//! with one call, writing to the console, a file, or both.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Errors from installing the global subscriber.
#[derive(Debug, Error)]
pub enum LogError {
    /// A global subscriber is already installed.
    #[error("a global logging subscriber is already installed")]
    AlreadyInitialized,
    /// The log file could not be created.
    #[error("failed to open log file")]
    File(#[from] std::io::Error),
}

/// Sink configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Maximum level that will be recorded.
    pub level: Level,
    /// Whether events are written to stdout.
    pub console: bool,
    /// Optional file to append events to, alongside or instead of the console.
    pub file: Option<PathBuf>,
    /// Whether console output is colorized.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            console: true,
            file: None,
            ansi: true,
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// May be called at most once per process; subsequent calls (or a subscriber
/// installed by the host application first) yield
/// [`LogError::AlreadyInitialized`].
pub fn init(config: &LogConfig) -> Result<(), LogError> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_ansi(config.ansi);
    match (&config.file, config.console) {
        (Some(path), true) => {
            let file = Arc::new(File::create(path)?);
            builder
                .with_writer(std::io::stdout.and(move || Arc::clone(&file)))
                .try_init()
                .map_err(|_| LogError::AlreadyInitialized)
        }
        (Some(path), false) => {
            let file = Arc::new(File::create(path)?);
            builder
                .with_writer(move || Arc::clone(&file))
                .try_init()
                .map_err(|_| LogError::AlreadyInitialized)
        }
        (None, true) => builder.try_init().map_err(|_| LogError::AlreadyInitialized),
        (None, false) => builder
            .with_writer(std::io::sink)
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized),
    }
}
