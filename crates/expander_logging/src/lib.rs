#![deny(missing_docs)]
//! Shared logging utilities for the expander workspace.
//!
//! This crate provides the `expander_*` logging macros used across the codebase,
//! a thread-local mutation batch counter that tags log lines emitted while a batch
//! is being processed, and initializers for the global logger.

use std::cell::Cell;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log;

thread_local! {
    /// Sequence number of the mutation batch currently being processed on this thread.
    static BATCH_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Sets the mutation batch sequence number for the current thread.
/// Pass 0 once the batch is done so later lines are not tagged.
pub fn set_batch_seq(seq: u64) {
    BATCH_SEQ.with(|v| v.set(seq));
}

/// Retrieves the mutation batch sequence number for the current thread.
/// Returns 0 outside of batch processing.
pub fn current_batch_seq() -> u64 {
    BATCH_SEQ.with(|v| v.get())
}

/// Log line prefix naming the active batch, empty outside of one.
#[doc(hidden)]
pub struct BatchTag;

impl fmt::Display for BatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match current_batch_seq() {
            0 => Ok(()),
            seq => write!(f, "[batch {seq}] "),
        }
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! expander_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("{}{}", $crate::BatchTag, format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! expander_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("{}{}", $crate::BatchTag, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! expander_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("{}{}", $crate::BatchTag, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! expander_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("{}{}", $crate::BatchTag, format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! expander_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("{}{}", $crate::BatchTag, format_args!($($arg)*));
    }};
}

/// Destination for log output.
#[derive(Debug, Clone)]
pub enum LogDestination {
    /// Write to the given file, truncating it.
    File(PathBuf),
    /// Write to terminal (stdout).
    Terminal,
    /// Write to both file and terminal.
    Both(PathBuf),
}

/// Initialize the global logger with the specified destination and level.
///
/// A file that cannot be created is reported on stderr and skipped. Calling this
/// after a logger is already installed is a no-op.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File(path) => match create_file_logger(&path, level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => {
            vec![TermLogger::new(
                level,
                config,
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]
        }
        LogDestination::Both(path) => {
            let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
                level,
                config.clone(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
