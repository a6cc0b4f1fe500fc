/*
 *  longship-sdk/src/log.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Per-binary logging indirection over the host logging table
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

//! Logging indirection layer
//!
//! Each binary image (the host executable and every plugin) links its own
//! copy of this crate and therefore owns its own [`LoggingSlot`]. The slot
//! holds a pointer to the host's [`LongshipLoggingVTable`] once the binary's
//! init code has validated and installed it.
//!
//! Messages are formatted inside the calling binary. Only the finished text
//! and plain scalars cross the boundary, never format strings or arguments.
//!
//! ```ignore
//! longship_sdk::category!(pub Renderer = "Renderer");
//!
//! longship_sdk::info!(Renderer, "created swapchain with {} images", count);
//! ```
//!
//! Logging never panics on a missing table: the call becomes a no-op with a
//! one-line note on stderr.

use std::ffi::{c_char, CStr, CString};
use std::fmt::{self, Write as _};
use std::io::{self, Write as _};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::abi::{self, AbiError};
use crate::ffi::{
    LongshipLogLevel,
    LongshipLoggingVTable,
    LONGSHIP_LOG_CRITICAL,
    LONGSHIP_LOG_DEBUG,
    LONGSHIP_LOG_ERROR,
    LONGSHIP_LOG_INFO,
    LONGSHIP_LOG_OFF,
    LONGSHIP_LOG_TRACE,
    LONGSHIP_LOG_WARN,
};

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum LogLevel {
    Trace = LONGSHIP_LOG_TRACE,
    Debug = LONGSHIP_LOG_DEBUG,
    Info = LONGSHIP_LOG_INFO,
    Warn = LONGSHIP_LOG_WARN,
    Error = LONGSHIP_LOG_ERROR,
    Critical = LONGSHIP_LOG_CRITICAL,
    /// Logging disabled
    Off = LONGSHIP_LOG_OFF,
}

impl LogLevel {
    /// Decode a wire value. Unknown codes disable logging.
    pub const fn from_raw(raw: LongshipLogLevel) -> Self {
        match raw {
            LONGSHIP_LOG_TRACE => LogLevel::Trace,
            LONGSHIP_LOG_DEBUG => LogLevel::Debug,
            LONGSHIP_LOG_INFO => LogLevel::Info,
            LONGSHIP_LOG_WARN => LogLevel::Warn,
            LONGSHIP_LOG_ERROR => LogLevel::Error,
            LONGSHIP_LOG_CRITICAL => LogLevel::Critical,
            _ => LogLevel::Off,
        }
    }

    pub const fn as_raw(self) -> LongshipLogLevel {
        self as LongshipLogLevel
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Off => "off",
        }
    }

    /// Parse a level name as used in config files and on the command line
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "critical" | "fatal" => Some(LogLevel::Critical),
            "off" | "none" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical subsystem name bound at compile time
///
/// Implement with [`category!`](crate::category).
pub trait Category {
    const NAME: &'static CStr;
}

/// Declare a logging category type.
///
/// ```ignore
/// longship_sdk::category!(pub(crate) Lifecycle = "Lifecycle");
/// ```
#[macro_export]
macro_rules! category {
    ($(#[$meta:meta])* $vis:vis $ident:ident = $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $ident;

        impl $crate::log::Category for $ident {
            const NAME: &'static ::std::ffi::CStr =
                match ::std::ffi::CStr::from_bytes_with_nul(::std::concat!($name, "\0").as_bytes()) {
                    ::std::result::Result::Ok(name) => name,
                    ::std::result::Result::Err(_) => ::std::panic!("category name contains a NUL byte"),
                };
        }
    };
}

/// Call site captured by the logging macros. Both strings are NUL-terminated.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl Location {
    fn file(&self) -> &'static CStr {
        nul_terminated(self.file)
    }

    fn function(&self) -> &'static CStr {
        nul_terminated(self.function)
    }
}

fn nul_terminated(s: &'static str) -> &'static CStr {
    CStr::from_bytes_with_nul(s.as_bytes()).unwrap_or(c"?")
}

#[doc(hidden)]
#[macro_export]
macro_rules! __location {
    () => {
        $crate::log::Location {
            file: ::std::concat!(::std::file!(), "\0"),
            line: ::std::line!(),
            function: ::std::concat!(::std::module_path!(), "\0"),
        }
    };
}

/// Log at an explicit level: `log_at!(LogLevel::Info, Category, "fmt", args..)`
#[macro_export]
macro_rules! log_at {
    ($level:expr, $category:ty, $($arg:tt)+) => {
        $crate::log::dispatch::<$category>($level, &$crate::__location!(), ::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($category:ty, $($arg:tt)+) => { $crate::log_at!($crate::log::LogLevel::Trace, $category, $($arg)+) };
}

#[macro_export]
macro_rules! debug {
    ($category:ty, $($arg:tt)+) => { $crate::log_at!($crate::log::LogLevel::Debug, $category, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($category:ty, $($arg:tt)+) => { $crate::log_at!($crate::log::LogLevel::Info, $category, $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    ($category:ty, $($arg:tt)+) => { $crate::log_at!($crate::log::LogLevel::Warn, $category, $($arg)+) };
}

#[macro_export]
macro_rules! error {
    ($category:ty, $($arg:tt)+) => { $crate::log_at!($crate::log::LogLevel::Error, $category, $($arg)+) };
}

#[macro_export]
macro_rules! critical {
    ($category:ty, $($arg:tt)+) => { $crate::log_at!($crate::log::LogLevel::Critical, $category, $($arg)+) };
}

/// Write a one-line diagnostic straight to stderr, bypassing the logging
/// table so a broken table can never recurse into itself.
fn diagnostic(args: fmt::Arguments<'_>) {
    #[cfg(test)]
    tests::DIAGNOSTICS.with(|count| count.set(count.get() + 1));

    let _ = writeln!(io::stderr().lock(), "longship: {}", args);
}

/// Format a message into a C string owned by the calling binary
fn format_message(args: fmt::Arguments<'_>) -> CString {
    let mut text = String::new();
    if text.write_fmt(args).is_err() {
        text.push_str("<message formatting failed>");
    }

    // An interior NUL would silently cut the message short on the other side.
    if text.contains('\0') {
        text = text.replace('\0', "\\0");
    }

    CString::new(text).unwrap_or_default()
}

/// The installed-table slot of one binary image
pub struct LoggingSlot {
    api: AtomicPtr<LongshipLoggingVTable>,
}

impl LoggingSlot {
    pub const fn new() -> Self {
        Self {
            api: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Validate `table` and make it this slot's logging target.
    ///
    /// Any rejection, a null `table` included, leaves the slot empty and
    /// prints one line to stderr.
    ///
    /// # Safety
    ///
    /// `table` must be null or point to a table that stays valid and
    /// unchanged until it is replaced or uninstalled (in practice, a
    /// host-owned static).
    pub unsafe fn install(&self, table: *const LongshipLoggingVTable) -> Result<(), AbiError> {
        let checked = unsafe { abi::validate(table) }
            .and_then(|api| abi::require::<LongshipLoggingVTable, _>("log_message", api.log_message).map(|_| api));

        match checked {
            Ok(api) => {
                self.api
                    .store(api as *const LongshipLoggingVTable as *mut LongshipLoggingVTable, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                self.uninstall();
                diagnostic(format_args!("logging disabled for this binary: {}", e));
                Err(e)
            }
        }
    }

    /// Drop the installed table; later log calls become no-ops
    pub fn uninstall(&self) {
        self.api.store(ptr::null_mut(), Ordering::Release);
    }

    pub fn is_installed(&self) -> bool {
        !self.api.load(Ordering::Acquire).is_null()
    }

    fn api(&self) -> Option<&LongshipLoggingVTable> {
        let api = self.api.load(Ordering::Acquire);
        // SAFETY: only validated tables are stored, and `install` requires
        // them to outlive their installation.
        unsafe { api.as_ref() }
    }

    /// Format and forward one message.
    pub fn log(&self, level: LogLevel, category: &CStr, location: &Location, args: fmt::Arguments<'_>) {
        let Some(api) = self.api() else {
            diagnostic(format_args!("logging API not installed in this binary, dropping message"));
            return;
        };

        let Some(log_message) = api.log_message else {
            diagnostic(format_args!("logging API has no log_message, dropping message"));
            return;
        };

        let message = format_message(args);
        let line = i32::try_from(location.line).unwrap_or(i32::MAX);

        log_message(
            level.as_raw(),
            category.as_ptr(),
            location.file().as_ptr() as *const c_char,
            line,
            location.function().as_ptr() as *const c_char,
            message.as_ptr(),
        );
    }

    /// Host global level, or `Off` when the host cannot report it
    pub fn level(&self) -> LogLevel {
        self.api()
            .and_then(|api| api.get_global_log_level)
            .map(|get| LogLevel::from_raw(get()))
            .unwrap_or(LogLevel::Off)
    }

    /// Whether [`level`](Self::level) reflects the host rather than a default
    pub fn can_read_level(&self) -> bool {
        self.api().is_some_and(|api| api.get_global_log_level.is_some())
    }

    /// Change the host global level. No-op when the host cannot do that.
    pub fn set_level(&self, level: LogLevel) {
        if let Some(set) = self.api().and_then(|api| api.set_global_log_level) {
            set(level.as_raw());
        }
    }
}

impl Default for LoggingSlot {
    fn default() -> Self {
        Self::new()
    }
}

static SLOT: LoggingSlot = LoggingSlot::new();

/// The slot belonging to the binary this code is linked into
pub fn slot() -> &'static LoggingSlot {
    &SLOT
}

/// Install the host logging table for this binary.
///
/// # Safety
///
/// See [`LoggingSlot::install`].
pub unsafe fn install(table: *const LongshipLoggingVTable) -> Result<(), AbiError> {
    unsafe { SLOT.install(table) }
}

pub fn uninstall() {
    SLOT.uninstall();
}

pub fn is_installed() -> bool {
    SLOT.is_installed()
}

pub fn level() -> LogLevel {
    SLOT.level()
}

pub fn set_level(level: LogLevel) {
    SLOT.set_level(level);
}

#[doc(hidden)]
pub fn dispatch<C: Category>(level: LogLevel, location: &Location, args: fmt::Arguments<'_>) {
    SLOT.log(level, C::NAME, location, args);
}

/// Restores the host global level it saw at creation when dropped
#[must_use = "the level is restored when the guard is dropped"]
pub struct LevelGuard<'a> {
    slot: &'a LoggingSlot,
    saved: Option<LogLevel>,
}

impl LevelGuard<'static> {
    /// Save the level of this binary's slot
    pub fn save() -> Self {
        LevelGuard::save_in(&SLOT)
    }
}

impl<'a> LevelGuard<'a> {
    pub fn save_in(slot: &'a LoggingSlot) -> Self {
        let saved = slot.can_read_level().then(|| slot.level());
        Self { slot, saved }
    }

    pub fn saved(&self) -> Option<LogLevel> {
        self.saved
    }
}

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        if let Some(level) = self.saved {
            self.slot.set_level(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{struct_size_of, LONGSHIP_LOGGING_ABI_VERSION};
    use std::cell::Cell;
    use std::sync::atomic::AtomicU32;
    use std::sync::{Arc, Mutex};
    use std::thread;

    thread_local! {
        // Diagnostics written by the current test thread
        pub(super) static DIAGNOSTICS: Cell<usize> = const { Cell::new(0) };
    }

    fn diagnostics() -> usize {
        DIAGNOSTICS.with(Cell::get)
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Captured {
        level: u32,
        category: String,
        file: String,
        line: i32,
        function: String,
        message: String,
    }

    static CAPTURED: Mutex<Vec<Captured>> = Mutex::new(Vec::new());
    static LEVEL: AtomicU32 = AtomicU32::new(LONGSHIP_LOG_INFO);

    fn text(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    extern "C" fn capture(
        level: u32,
        category: *const c_char,
        file: *const c_char,
        line: i32,
        function: *const c_char,
        message: *const c_char,
    ) {
        let record = Captured {
            level,
            category: text(category),
            file: text(file),
            line,
            function: text(function),
            message: text(message),
        };
        CAPTURED.lock().unwrap().push(record);
    }

    extern "C" fn get_level() -> u32 {
        LEVEL.load(Ordering::SeqCst)
    }

    extern "C" fn set_level_fn(level: u32) {
        LEVEL.store(level, Ordering::SeqCst);
    }

    static GOOD_TABLE: LongshipLoggingVTable = LongshipLoggingVTable {
        abi_version: LONGSHIP_LOGGING_ABI_VERSION,
        struct_size: struct_size_of::<LongshipLoggingVTable>(),
        log_message: Some(capture),
        get_global_log_level: Some(get_level),
        set_global_log_level: Some(set_level_fn),
    };

    static FUTURE_TABLE: LongshipLoggingVTable = LongshipLoggingVTable {
        abi_version: 2,
        struct_size: struct_size_of::<LongshipLoggingVTable>(),
        log_message: Some(capture),
        get_global_log_level: Some(get_level),
        set_global_log_level: Some(set_level_fn),
    };

    static MUTE_TABLE: LongshipLoggingVTable = LongshipLoggingVTable {
        abi_version: LONGSHIP_LOGGING_ABI_VERSION,
        struct_size: struct_size_of::<LongshipLoggingVTable>(),
        log_message: None,
        get_global_log_level: None,
        set_global_log_level: None,
    };

    crate::category!(RoundTrip = "RoundTrip");
    crate::category!(Mismatch = "Mismatch");
    crate::category!(Threads = "Threads");
    crate::category!(Nul = "Nul");

    fn captured_for(category: &str) -> Vec<Captured> {
        CAPTURED
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.category == category)
            .cloned()
            .collect()
    }

    #[test]
    fn test_round_trip_forwards_exact_tuple() {
        let slot = LoggingSlot::new();
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();

        let location = Location {
            file: "src/render.rs\0",
            line: 42,
            function: "longship::render\0",
        };
        slot.log(LogLevel::Warn, RoundTrip::NAME, &location, format_args!("{} images at {}x{}", 3, 800, 600));

        let records = captured_for("RoundTrip");
        assert_eq!(
            records,
            vec![Captured {
                level: LONGSHIP_LOG_WARN,
                category: "RoundTrip".into(),
                file: "src/render.rs".into(),
                line: 42,
                function: "longship::render".into(),
                message: "3 images at 800x600".into(),
            }]
        );
    }

    #[test]
    fn test_version_mismatch_leaves_slot_empty() {
        let slot = LoggingSlot::new();
        let result = unsafe { slot.install(&FUTURE_TABLE) };

        assert!(matches!(result, Err(AbiError::VersionMismatch { expected: 1, found: 2, .. })));
        assert!(!slot.is_installed());

        let location = Location { file: "a.rs\0", line: 1, function: "a\0" };
        slot.log(LogLevel::Error, Mismatch::NAME, &location, format_args!("never delivered"));
        assert!(captured_for("Mismatch").is_empty());
    }

    #[test]
    fn test_mismatch_replaces_previous_install() {
        let slot = LoggingSlot::new();
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();
        assert!(slot.is_installed());

        let _ = unsafe { slot.install(&FUTURE_TABLE) };
        assert!(!slot.is_installed());
    }

    #[test]
    fn test_table_without_log_message_is_rejected() {
        let slot = LoggingSlot::new();
        let result = unsafe { slot.install(&MUTE_TABLE) };
        assert!(matches!(result, Err(AbiError::MissingFunction { function: "log_message", .. })));
        assert!(!slot.is_installed());
    }

    #[test]
    fn test_uninstalled_slot_is_safe() {
        let slot = LoggingSlot::new();
        let location = Location { file: "a.rs\0", line: 1, function: "a\0" };
        slot.log(LogLevel::Info, RoundTrip::NAME, &location, format_args!("dropped"));
        assert_eq!(slot.level(), LogLevel::Off);
        slot.set_level(LogLevel::Trace);
        assert!(unsafe { slot.install(ptr::null()) }.is_err());
    }

    #[test]
    fn test_every_rejection_writes_one_diagnostic() {
        let slot = LoggingSlot::new();
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();

        let before = diagnostics();
        let result = unsafe { slot.install(ptr::null()) };
        assert!(matches!(result, Err(AbiError::Null { table: "logging" })));
        assert!(!slot.is_installed());
        assert_eq!(diagnostics(), before + 1);

        let before = diagnostics();
        assert!(unsafe { slot.install(&MUTE_TABLE) }.is_err());
        assert_eq!(diagnostics(), before + 1);

        // A good table is silent.
        let before = diagnostics();
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();
        assert_eq!(diagnostics(), before);
    }

    #[test]
    fn test_level_forwarding_and_guard() {
        let slot = LoggingSlot::new();
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();

        slot.set_level(LogLevel::Debug);
        assert_eq!(slot.level(), LogLevel::Debug);

        {
            let guard = LevelGuard::save_in(&slot);
            assert_eq!(guard.saved(), Some(LogLevel::Debug));
            slot.set_level(LogLevel::Critical);
            assert_eq!(slot.level(), LogLevel::Critical);
        }

        assert_eq!(slot.level(), LogLevel::Debug);
    }

    #[test]
    fn test_interior_nul_is_escaped() {
        let slot = LoggingSlot::new();
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();

        let location = Location { file: "a.rs\0", line: 7, function: "a\0" };
        slot.log(LogLevel::Info, Nul::NAME, &location, format_args!("before{}after", '\0'));

        let records = captured_for("Nul");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "before\\0after");
    }

    #[test]
    fn test_concurrent_calls_are_not_torn() {
        let slot = Arc::new(LoggingSlot::new());
        unsafe { slot.install(&GOOD_TABLE) }.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || {
                    let location = Location { file: "t.rs\0", line: t, function: "t\0" };
                    for i in 0..100 {
                        slot.log(
                            LogLevel::Info,
                            Threads::NAME,
                            &location,
                            format_args!("thread {} message {} {}", t, i, "x".repeat(64)),
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let records = captured_for("Threads");
        assert_eq!(records.len(), 800);
        for record in records {
            let expected_prefix = format!("thread {} message ", record.line);
            assert!(record.message.starts_with(&expected_prefix));
            assert!(record.message.ends_with(&"x".repeat(64)));
        }
    }

    #[test]
    fn test_level_parse_and_raw() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("bogus"), None);
        assert_eq!(LogLevel::from_raw(99), LogLevel::Off);
        assert_eq!(LogLevel::from_raw(LogLevel::Critical.as_raw()), LogLevel::Critical);
        assert!(LogLevel::Trace < LogLevel::Critical);
    }
}
