//! Program logging, built on the `log` facade with a `fern` dispatch.
//!
//! Console output is split between stdout (routine messages) and stderr (warnings and
//! errors), colourised when attached to a terminal. When an output folder is available,
//! plain-text copies of both streams are additionally written to per-run log files there.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the program logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used when neither the settings file nor the UCDM_LOG_LEVEL environment
/// variable says otherwise
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The per-run log file for routine messages
const LOG_INFO_FILE_NAME: &str = "ucdm_info.log";

/// The per-run log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "ucdm_error.log";

/// Whether [`init`] has completed successfully in this process
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Install the program logger.
///
/// The level is resolved in order of precedence: the `UCDM_LOG_LEVEL` environment
/// variable, then `log_level_from_settings` (the value from `settings.toml`), then
/// [`DEFAULT_LOG_LEVEL`]. Accepted names are `off`, `error`, `warn`, `info`, `debug` and
/// `trace`.
///
/// If `log_file_path` is given, `ucdm_info.log` and `ucdm_error.log` are created there
/// and receive plain-text copies of the console streams.
///
/// Fails on an unknown level name, or if a logger has already been installed in this
/// process.
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = env::var("UCDM_LOG_LEVEL").unwrap_or_else(|_| {
        log_level_from_settings
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    });

    let log_level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Colours only make sense on a terminal; piped output stays plain
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    let (info_log_file, err_log_file) = if let Some(log_file_path) = log_file_path {
        let new_log_file = |file_name| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(log_file_path.join(file_name))
        };
        (
            Some(new_log_file(LOG_INFO_FILE_NAME)?),
            Some(new_log_file(LOG_ERROR_FILE_NAME)?),
        )
    } else {
        (None, None)
    };

    let mut dispatch = Dispatch::new()
        .chain(
            // Routine messages go to stdout
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            // Warnings and errors go to stderr
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    // Mirror both streams to log files when an output folder was given
    if let Some(info_log_file) = info_log_file {
        dispatch = dispatch.chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(write_log_plain)
                .level(log_level.max(LevelFilter::Info))
                .chain(info_log_file),
        );
    }

    if let Some(err_log_file) = err_log_file {
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(write_log_plain)
                .level(LevelFilter::Warn)
                .chain(err_log_file),
        );
    }

    // Fails if a logger was already installed in this process
    dispatch.apply()?;

    LOGGER_INIT.set(()).unwrap();

    Ok(())
}

/// Emit one log line: timestamp, level, target, message
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

/// Emit a log line without colour codes (the log file format)
fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

/// Emit a log line, colourising the level name when requested
fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
