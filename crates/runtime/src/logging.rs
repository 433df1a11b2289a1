//! Process logger for the agency binaries.
//!
//! Lines go to stderr as `<local time> <LEVEL> <target>: <message>`.

use std::{
    io::{self, Write},
    sync::OnceLock,
};

use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::PROGRAM_LOG_LEVEL;

const FALLBACK_LEVEL: Level = Level::Info;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub struct StderrLogger {
    threshold: Level,
}

impl StderrLogger {
    pub const fn new(threshold: Level) -> Self {
        Self { threshold }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.threshold
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = render(record, Local::now());
        // Nowhere left to report a failed write to stderr.
        let _ = writeln!(io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Formats one record, without the trailing newline.
pub fn render(record: &Record<'_>, at: DateTime<Local>) -> String {
    format!(
        "{} {:<5} {}: {}",
        at.format(TIMESTAMP_FORMAT),
        record.level(),
        record.target(),
        record.args()
    )
}

/// Case-insensitive level name. `off` is not a level, so it yields `None`.
pub fn parse_level(name: &str) -> Option<Level> {
    name.trim()
        .parse::<LevelFilter>()
        .ok()
        .and_then(|filter| filter.to_level())
}

fn level_or_fallback(name: Option<&str>) -> Level {
    name.and_then(parse_level).unwrap_or(FALLBACK_LEVEL)
}

fn level_from_env() -> Level {
    level_or_fallback(std::env::var(PROGRAM_LOG_LEVEL).ok().as_deref())
}

/// Installs the logger at the level named by `CLI_LOG_LEVEL`.
pub fn init() -> Result<(), SetLoggerError> {
    init_with_level(level_from_env())
}

/// Installs the logger at `level`. Later calls are no-ops.
pub fn init_with_level(level: Level) -> Result<(), SetLoggerError> {
    static INSTALLED: OnceLock<StderrLogger> = OnceLock::new();

    let mut fresh = false;
    let logger = INSTALLED.get_or_init(|| {
        fresh = true;
        StderrLogger::new(level)
    });
    if fresh {
        log::set_logger(logger)?;
        log::set_max_level(logger.threshold.to_level_filter());
    }
    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
