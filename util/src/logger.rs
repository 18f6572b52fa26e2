//! Logging setup shared by the board executables

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Per-target levels applied on top of the minimum level.
///
/// The HAL crate is chatty at debug and the raw bus transfers are only useful
/// when chasing a wiring fault, so both are capped unless overridden.
pub const DEFAULT_TARGET_LEVELS: &[(&str, LevelFilter)] = &[
    ("rppal", LevelFilter::Info),
    ("periph::bus", LevelFilter::Debug),
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error opening the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution with the default target levels.
///
/// # Notes
///
/// - `min_level` must be at least `log::Level::Info`.
/// - Register traffic from the drivers is logged at `trace` under
///   `periph::bus`, which is capped at `Debug` here. Use
///   [`logger_init_with_levels`] to see it.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {
    logger_init_with_levels(min_level, DEFAULT_TARGET_LEVELS, session)
}

/// Initialise the logger with explicit per-target levels.
///
/// Output goes to stdout and to the session's log file.
pub fn logger_init_with_levels(
    min_level: LevelFilter,
    target_levels: &[(&'static str, LevelFilter)],
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(min_level);

    for &(target, level) in target_levels {
        dispatch = dispatch.level_for(target, level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    for (target, level) in target_levels {
        info!("    {} capped at {:?}", target, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build one log line. Debug and trace lines include the target module.
fn format_line(
    elapsed_s: f64,
    level: log::Level,
    target: &str,
    message: impl std::fmt::Display
) -> String {
    if level > log::Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, level_to_str(level), target, message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level_to_str(level), message)
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_line() {
        colored::control::set_override(false);

        assert_eq!(
            format_line(1.5, log::Level::Info, "periph::pwm", "PWM ready"),
            "[  1.500000 INF] PWM ready"
        );
        assert_eq!(
            format_line(0.25, log::Level::Trace, "periph::bus", "0x40 <- 0x11"),
            "[  0.250000 TRC] periph::bus: 0x40 <- 0x11"
        );
    }
}
