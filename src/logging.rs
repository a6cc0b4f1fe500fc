/*
 *  logging.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Host logging backend behind the logging ABI table
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Host logging backend
//!
//! The host owns one static [`LongshipLoggingVTable`]. Every binary image,
//! the host included, logs through it. Records are handed to the `log`
//! facade with the category as target, and `env_logger` writes them to
//! stderr and optionally to a log file.
//!
//! The authoritative global level lives here in an atomic so `Critical`
//! stays distinct from `Error`; `log::set_max_level` mirrors it.

use std::ffi::{c_char, CStr};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use env_logger::{Env, Target};
use longship_sdk::ffi::{
    struct_size_of,
    LongshipLogLevel,
    LongshipLoggingVTable,
    LONGSHIP_LOGGING_ABI_VERSION,
};
use longship_sdk::LogLevel;
use thiserror::Error;

longship_sdk::category!(
    /// Engine core messages
    pub Core = "Core"
);
longship_sdk::category!(pub EntryPoint = "EntryPoint");
longship_sdk::category!(pub EngineConfig = "EngineConfig");
longship_sdk::category!(pub Plugins = "Plugins");
longship_sdk::category!(pub Renderer = "Renderer");

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("a different logger is already registered: {0}")]
    SetLogger(#[from] log::SetLoggerError),

    #[error("host logging table rejected: {0}")]
    Table(#[from] longship_sdk::AbiError),
}

/// Options for [`init`]
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Initial global level
    pub level: LogLevel,

    /// Also append every record to this file
    pub log_file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_file: None,
        }
    }
}

static GLOBAL_LEVEL: AtomicU32 = AtomicU32::new(LogLevel::Info as u32);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub(crate) static LOGGING_API: LongshipLoggingVTable = LongshipLoggingVTable {
    abi_version: LONGSHIP_LOGGING_ABI_VERSION,
    struct_size: struct_size_of::<LongshipLoggingVTable>(),
    log_message: Some(host_log_message),
    get_global_log_level: Some(host_get_global_log_level),
    set_global_log_level: Some(host_set_global_log_level),
};

/// The host logging table. Valid for the whole process.
pub fn logging_api() -> &'static LongshipLoggingVTable {
    &LOGGING_API
}

pub fn global_level() -> LogLevel {
    LogLevel::from_raw(GLOBAL_LEVEL.load(Ordering::Acquire))
}

/// Change the global level for every binary image
pub fn set_global_level(level: LogLevel) {
    GLOBAL_LEVEL.store(level.as_raw(), Ordering::Release);
    log::set_max_level(level_filter(level));
}

fn level_filter(level: LogLevel) -> log::LevelFilter {
    match level {
        LogLevel::Trace => log::LevelFilter::Trace,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Error | LogLevel::Critical => log::LevelFilter::Error,
        LogLevel::Off => log::LevelFilter::Off,
    }
}

fn record_level(level: LogLevel) -> Option<log::Level> {
    match level {
        LogLevel::Trace => Some(log::Level::Trace),
        LogLevel::Debug => Some(log::Level::Debug),
        LogLevel::Info => Some(log::Level::Info),
        LogLevel::Warn => Some(log::Level::Warn),
        LogLevel::Error | LogLevel::Critical => Some(log::Level::Error),
        LogLevel::Off => None,
    }
}

/// Copies everything written to stderr into a log file as well
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Set up the `env_logger` sink and install the host table into the host's
/// own logging slot.
///
/// Only the first call does anything; later calls leave the running setup
/// alone and say so on stderr.
pub fn init(config: &LoggerConfig) -> Result<(), LoggingError> {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        let _ = writeln!(io::stderr(), "longship: logging already initialized, ignoring second init");
        return Ok(());
    }

    // RUST_LOG narrows per category; the global level gates everything else.
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("trace"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {:<5} {} {}:{}] {}",
            buf.timestamp_millis(),
            record.level(),
            record.target(),
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.args()
        )
    });

    if let Some(path) = config.log_file.as_ref() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggingError::LogFile {
                path: path.clone(),
                source,
            })?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
    }

    builder.try_init()?;
    set_global_level(config.level);

    // SAFETY: LOGGING_API is a static.
    unsafe { longship_sdk::log::install(&LOGGING_API) }?;
    Ok(())
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Borrow a C string handed across the boundary, or fall back
unsafe fn borrowed<'a>(ptr: *const c_char, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        return fallback.into();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
}

fn forward(
    level: LongshipLogLevel,
    category: *const c_char,
    file: *const c_char,
    line: i32,
    function: *const c_char,
    message: *const c_char,
) {
    let level = LogLevel::from_raw(level);
    let Some(record_level) = record_level(level) else {
        return;
    };
    if level < global_level() {
        return;
    }

    // SAFETY: callers pass NUL-terminated strings valid for this call.
    let (category, file, function, message) = unsafe {
        (
            borrowed(category, "General"),
            borrowed(file, "?"),
            borrowed(function, "?"),
            borrowed(message, ""),
        )
    };

    let prefix = if level == LogLevel::Critical { "CRITICAL: " } else { "" };
    log::logger().log(
        &log::Record::builder()
            .level(record_level)
            .target(category.as_ref())
            .file(Some(file.as_ref()))
            .line(u32::try_from(line).ok())
            .module_path(Some(function.as_ref()))
            .args(format_args!("{}{}", prefix, message))
            .build(),
    );
}

extern "C" fn host_log_message(
    level: LongshipLogLevel,
    category: *const c_char,
    file: *const c_char,
    line: i32,
    function: *const c_char,
    message: *const c_char,
) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        forward(level, category, file, line, function, message)
    }));
}

extern "C" fn host_get_global_log_level() -> LongshipLogLevel {
    GLOBAL_LEVEL.load(Ordering::Acquire)
}

extern "C" fn host_set_global_log_level(level: LongshipLogLevel) {
    let _ = panic::catch_unwind(|| set_global_level(LogLevel::from_raw(level)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use longship_sdk::abi;

    #[test]
    fn test_host_table_passes_validation() {
        let table = unsafe { abi::validate(logging_api() as *const LongshipLoggingVTable) }.unwrap();
        assert!(table.log_message.is_some());
        assert!(table.get_global_log_level.is_some());
        assert!(table.set_global_log_level.is_some());
    }

    #[test]
    fn test_level_round_trip_keeps_critical() {
        let get = logging_api().get_global_log_level.unwrap();
        let set = logging_api().set_global_log_level.unwrap();
        let before = get();

        set(LogLevel::Critical.as_raw());
        assert_eq!(global_level(), LogLevel::Critical);
        assert_eq!(log::max_level(), log::LevelFilter::Error);

        set(before);
        assert_eq!(get(), before);
    }

    #[test]
    fn test_null_strings_are_tolerated() {
        let log_message = logging_api().log_message.unwrap();
        log_message(LogLevel::Error.as_raw(), std::ptr::null(), std::ptr::null(), -1, std::ptr::null(), std::ptr::null());
    }
}
