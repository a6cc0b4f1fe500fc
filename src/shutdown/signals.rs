/*
 *  shutdown/signals.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  OS signal handlers feeding the signal path of the shutdown state
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

//! Signal bridge
//!
//! Install once, early, before any plugin is loaded. The handler itself only
//! calls [`ShutdownState::request_from_signal`](super::ShutdownState::request_from_signal).

use std::io;
use std::sync::OnceLock;

use libc::c_int;

use super::Reason;

#[cfg(windows)]
const SIGBREAK: c_int = 21;

/// Map a delivered signal number to the reason it records
pub const fn reason_for_signal(signal: c_int) -> Reason {
    match signal {
        libc::SIGINT => Reason::Sigint,
        libc::SIGTERM => Reason::Sigterm,
        #[cfg(windows)]
        SIGBREAK => Reason::Sigbreak,
        _ => Reason::Unknown,
    }
}

extern "C" fn interrupt_handler(signal: c_int) {
    super::global().request_from_signal(reason_for_signal(signal));
}

/// Raw, unbuffered stderr write for registration failures
fn write_stderr(message: &[u8]) {
    #[cfg(unix)]
    unsafe {
        libc::write(libc::STDERR_FILENO, message.as_ptr().cast(), message.len());
    }

    #[cfg(not(unix))]
    {
        use std::io::Write;
        let _ = io::stderr().write_all(message);
    }
}

#[cfg(unix)]
fn install() -> Result<(), i32> {
    use std::{mem, ptr};

    const TARGETS: [(c_int, &[u8]); 2] = [
        (libc::SIGINT, b"longship::shutdown ERROR: could not register SIGINT handler.\n"),
        (libc::SIGTERM, b"longship::shutdown ERROR: could not register SIGTERM handler.\n"),
    ];

    // SAFETY: `action` is fully initialized before use and the handler
    // only performs relaxed atomic stores.
    unsafe {
        let mut action: libc::sigaction = mem::zeroed();
        action.sa_sigaction = interrupt_handler as extern "C" fn(c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaddset(&mut action.sa_mask, libc::SIGINT);
        libc::sigaddset(&mut action.sa_mask, libc::SIGTERM);
        action.sa_flags = libc::SA_RESTART;

        let mut first_error = None;
        for (signal, diagnostic) in TARGETS {
            if libc::sigaction(signal, &action, ptr::null_mut()) == -1 {
                let errno = io::Error::last_os_error().raw_os_error().unwrap_or(libc::EINVAL);
                write_stderr(diagnostic);
                first_error.get_or_insert(errno);
            }
        }

        match first_error {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }
}

#[cfg(windows)]
fn install() -> Result<(), i32> {
    const TARGETS: [(c_int, &[u8]); 3] = [
        (libc::SIGINT, b"longship::shutdown ERROR: could not register SIGINT handler.\r\n"),
        (libc::SIGTERM, b"longship::shutdown ERROR: could not register SIGTERM handler.\r\n"),
        (SIGBREAK, b"longship::shutdown ERROR: could not register SIGBREAK handler.\r\n"),
    ];

    let mut first_error = None;
    for (signal, diagnostic) in TARGETS {
        // SAFETY: the handler only performs relaxed atomic stores.
        let previous = unsafe { libc::signal(signal, interrupt_handler as extern "C" fn(c_int) as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            write_stderr(diagnostic);
            first_error.get_or_insert(libc::EINVAL);
        }
    }

    match first_error {
        Some(errno) => Err(errno),
        None => Ok(()),
    }
}

static REGISTERED: OnceLock<Result<(), i32>> = OnceLock::new();

/// Route SIGINT and SIGTERM (and SIGBREAK on Windows) into the process-wide
/// shutdown state.
///
/// Only the first call touches the OS; later calls report the same outcome.
/// On POSIX, interrupted system calls are restarted.
pub fn register_interrupt_handlers() -> io::Result<()> {
    (*REGISTERED.get_or_init(install)).map_err(io::Error::from_raw_os_error)
}

pub fn handlers_registered() -> bool {
    matches!(REGISTERED.get(), Some(Ok(())))
}
