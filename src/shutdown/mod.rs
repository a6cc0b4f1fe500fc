/*
 *  shutdown/mod.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Process-wide shutdown / restart request state
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

//! Shutdown state
//!
//! Two independent write paths feed one request record:
//!
//! - the signal path, written only from a signal handler: two plain words,
//!   no locks, no allocation
//! - the thread path, written from ordinary code: a claim flag and message
//!   under one mutex, plus an atomic reason and published flag stored while
//!   that mutex is held
//!
//! Both paths are first-writer-wins until [`ShutdownState::clear_request`].
//! Readers prefer the signal path when both are set.

pub mod signals;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use arrayvec::ArrayString;

/// Longest thread-path message kept, in bytes
pub const MAX_MESSAGE_LEN: usize = 256;

const NO_REASON_MESSAGE: &str = "shutdown reason queried but no shutdown was requested; \
     the caller either skipped is_requested() or the request was already cleared";

/// Why a shutdown (or restart) was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Reason {
    UserRequest = 0,
    UserRestart = 1,
    InvoluntaryRestart = 2,
    Sigterm = 3,
    Sigint = 4,
    Sigbreak = 5,
    FatalError = 6,
    Unknown = 7,
    SignalUnhandled = 8,
    /// Idle, nothing requested
    None = 9,
}

impl Reason {
    /// Decode a stored code; anything unrecognized is `Unknown`
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Reason::UserRequest,
            1 => Reason::UserRestart,
            2 => Reason::InvoluntaryRestart,
            3 => Reason::Sigterm,
            4 => Reason::Sigint,
            5 => Reason::Sigbreak,
            6 => Reason::FatalError,
            8 => Reason::SignalUnhandled,
            9 => Reason::None,
            _ => Reason::Unknown,
        }
    }

    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub const fn is_restart(self) -> bool {
        matches!(self, Reason::UserRestart | Reason::InvoluntaryRestart)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Reason::UserRequest => "User Requested",
            Reason::UserRestart => "User Restarted",
            Reason::InvoluntaryRestart => "Involuntary Restart",
            Reason::Sigterm => "SIGTERM",
            Reason::Sigint => "SIGINT",
            Reason::Sigbreak => "SIGBREAK",
            Reason::FatalError => "Fatal Error",
            Reason::Unknown => "Unknown",
            Reason::SignalUnhandled => "Signal was received, but no handler was registered.",
            Reason::None => "No reason for shutdown",
        }
    }

    /// Fixed text reported for a request that arrived through a signal
    const fn signal_message(self) -> &'static str {
        match self {
            Reason::Sigint => "[SIGINT] Interrupt request received. Reason: SIGINT",
            Reason::Sigterm => "[SIGTERM] Terminate request received. Reason: SIGTERM",
            Reason::Sigbreak => "[SIGBREAK] Break request received. Reason: SIGBREAK",
            Reason::SignalUnhandled => "[UNHANDLED] Signal received without a mapping. Reason: UNHANDLED",
            _ => "[UNKNOWN] Unknown signal request. Reason: UNKNOWN",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by [`ShutdownState::reason`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownInfo {
    pub reason: Reason,
    pub message: String,
}

/// One shutdown request record with its two write paths
pub struct ShutdownState {
    // Signal path. Relaxed loads and stores only: each word is written
    // whole, but no ordering between the two is promised.
    signal_requested: AtomicI32,
    signal_reason: AtomicI32,

    // Thread path. Every write happens under `thread`; `requested` is
    // published last, while the lock is still held.
    requested: AtomicBool,
    reason: AtomicI32,
    thread: Mutex<ThreadRequest>,
}

/// Thread-path fields only touched with the lock held
struct ThreadRequest {
    claimed: bool,
    message: ArrayString<MAX_MESSAGE_LEN>,
}

impl ShutdownState {
    pub const fn new() -> Self {
        Self {
            signal_requested: AtomicI32::new(0),
            signal_reason: AtomicI32::new(Reason::None as i32),
            requested: AtomicBool::new(false),
            reason: AtomicI32::new(Reason::None as i32),
            thread: Mutex::new(ThreadRequest {
                claimed: false,
                message: ArrayString::new_const(),
            }),
        }
    }

    fn thread(&self) -> MutexGuard<'_, ThreadRequest> {
        self.thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a shutdown from ordinary code.
    ///
    /// Returns `true` if this call won; later calls change nothing until the
    /// request is cleared. Messages longer than [`MAX_MESSAGE_LEN`] bytes are
    /// cut at a character boundary.
    pub fn request(&self, reason: Reason, message: Option<&str>) -> bool {
        let mut thread = self.thread();
        if thread.claimed {
            return false;
        }

        thread.claimed = true;
        copy_truncated(&mut thread.message, message.unwrap_or(""));
        self.reason.store(reason.as_raw(), Ordering::Release);
        self.requested.store(true, Ordering::Release);
        true
    }

    /// Request a shutdown from inside a signal handler.
    ///
    /// Async-signal-safe: two relaxed word stores, nothing else.
    pub fn request_from_signal(&self, reason: Reason) {
        if self.signal_requested.load(Ordering::Relaxed) != 0 {
            return;
        }

        self.signal_reason.store(reason.as_raw(), Ordering::Relaxed);
        self.signal_requested.store(1, Ordering::Relaxed);
    }

    fn signal_path_set(&self) -> bool {
        self.signal_requested.load(Ordering::Relaxed) != 0
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire) || self.signal_path_set()
    }

    /// True only for a thread-path restart reason. Signals never restart.
    pub fn restart_requested(&self) -> bool {
        if self.signal_path_set() {
            return false;
        }

        self.requested.load(Ordering::Acquire)
            && Reason::from_raw(self.reason.load(Ordering::Acquire)).is_restart()
    }

    /// The winning reason and its message.
    ///
    /// With nothing requested this answers `Reason::None` and a diagnostic
    /// message instead of failing.
    pub fn reason(&self) -> ShutdownInfo {
        if self.signal_path_set() {
            let reason = Reason::from_raw(self.signal_reason.load(Ordering::Relaxed));
            return ShutdownInfo {
                reason,
                message: reason.signal_message().to_string(),
            };
        }

        if self.requested.load(Ordering::Acquire) {
            let thread = self.thread();
            // A clear may have run between the flag load and the lock.
            if thread.claimed {
                return ShutdownInfo {
                    reason: Reason::from_raw(self.reason.load(Ordering::Acquire)),
                    message: thread.message.to_string(),
                };
            }
        }

        ShutdownInfo {
            reason: Reason::None,
            message: NO_REASON_MESSAGE.to_string(),
        }
    }

    /// Return both paths to idle. Safe to call when idle.
    ///
    /// A signal landing mid-clear may re-arm the signal path right away.
    pub fn clear_request(&self) {
        self.signal_reason.store(Reason::None.as_raw(), Ordering::Relaxed);
        self.signal_requested.store(0, Ordering::Relaxed);

        let mut thread = self.thread();
        self.requested.store(false, Ordering::Release);
        self.reason.store(Reason::None.as_raw(), Ordering::Release);
        thread.message.clear();
        thread.claimed = false;
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownState")
            .field("signal_requested", &self.signal_path_set())
            .field("requested", &self.requested.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

fn copy_truncated(dst: &mut ArrayString<MAX_MESSAGE_LEN>, src: &str) {
    dst.clear();
    let mut end = src.len().min(MAX_MESSAGE_LEN);
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    let _ = dst.try_push_str(&src[..end]);
}

static STATE: ShutdownState = ShutdownState::new();

/// The process-wide shutdown state
pub fn global() -> &'static ShutdownState {
    &STATE
}

pub fn request(reason: Reason, message: Option<&str>) -> bool {
    STATE.request(reason, message)
}

pub fn is_requested() -> bool {
    STATE.is_requested()
}

pub fn restart_requested() -> bool {
    STATE.restart_requested()
}

pub fn reason() -> ShutdownInfo {
    STATE.reason()
}

pub fn clear_request() {
    STATE.clear_request();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_idle_state() {
        let state = ShutdownState::new();
        assert!(!state.is_requested());
        assert!(!state.restart_requested());

        let info = state.reason();
        assert_eq!(info.reason, Reason::None);
        assert!(!info.message.is_empty());
    }

    #[test]
    fn test_first_request_wins() {
        let state = ShutdownState::new();
        assert!(state.request(Reason::UserRequest, Some("quit from menu")));
        assert!(!state.request(Reason::FatalError, Some("late failure")));

        let info = state.reason();
        assert_eq!(info.reason, Reason::UserRequest);
        assert_eq!(info.message, "quit from menu");
    }

    #[test]
    fn test_missing_message_is_empty() {
        let state = ShutdownState::new();
        state.request(Reason::FatalError, None);
        assert_eq!(state.reason().message, "");
    }

    #[test]
    fn test_restart_classification() {
        let all = [
            Reason::UserRequest,
            Reason::UserRestart,
            Reason::InvoluntaryRestart,
            Reason::Sigterm,
            Reason::Sigint,
            Reason::Sigbreak,
            Reason::FatalError,
            Reason::Unknown,
            Reason::SignalUnhandled,
            Reason::None,
        ];

        for reason in all {
            let state = ShutdownState::new();
            state.request(reason, None);
            assert!(state.is_requested());
            assert_eq!(state.restart_requested(), reason.is_restart(), "{reason:?}");
        }

        let restarts = all.iter().filter(|r| r.is_restart()).count();
        assert_eq!(restarts, 2);
    }

    #[test]
    fn test_signal_path_takes_precedence() {
        let state = ShutdownState::new();
        state.request(Reason::UserRestart, Some("reload"));
        state.request_from_signal(Reason::Sigint);

        let info = state.reason();
        assert_eq!(info.reason, Reason::Sigint);
        assert!(info.message.contains("SIGINT"));
        assert!(!state.restart_requested());
    }

    #[test]
    fn test_first_signal_wins() {
        let state = ShutdownState::new();
        state.request_from_signal(Reason::Sigterm);
        state.request_from_signal(Reason::Sigint);
        assert_eq!(state.reason().reason, Reason::Sigterm);
    }

    #[test]
    fn test_clear_rearms_both_paths() {
        let state = ShutdownState::new();
        state.request(Reason::UserRequest, Some("first"));
        state.request_from_signal(Reason::Sigterm);

        state.clear_request();
        assert!(!state.is_requested());
        assert_eq!(state.reason().reason, Reason::None);

        assert!(state.request(Reason::UserRestart, Some("second")));
        let info = state.reason();
        assert_eq!(info.reason, Reason::UserRestart);
        assert_eq!(info.message, "second");
        assert!(state.restart_requested());
    }

    #[test]
    fn test_clear_when_idle_is_noop() {
        let state = ShutdownState::new();
        state.clear_request();
        state.clear_request();
        assert!(!state.is_requested());
    }

    #[test]
    fn test_long_message_truncated_on_char_boundary() {
        let state = ShutdownState::new();
        let long = "é".repeat(200);
        state.request(Reason::FatalError, Some(&long));

        let message = state.reason().message;
        assert!(message.len() <= MAX_MESSAGE_LEN);
        assert_eq!(message.len(), MAX_MESSAGE_LEN);
        assert!(message.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_concurrent_requests_single_winner() {
        for _ in 0..20 {
            let state = Arc::new(ShutdownState::new());
            let barrier = Arc::new(Barrier::new(8));

            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let state = Arc::clone(&state);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        let message = format!("thread {i}");
                        state.request(Reason::UserRequest, Some(&message)).then_some(message)
                    })
                })
                .collect();

            let winners: Vec<String> = handles
                .into_iter()
                .filter_map(|h| h.join().unwrap())
                .collect();

            assert_eq!(winners.len(), 1);
            assert_eq!(state.reason().message, winners[0]);
        }
    }

    #[test]
    fn test_clear_racing_request_leaves_whole_state() {
        for _ in 0..2000 {
            let state = Arc::new(ShutdownState::new());
            let barrier = Arc::new(Barrier::new(2));

            let requester = {
                let state = Arc::clone(&state);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    state.request(Reason::UserRequest, Some("first"))
                })
            };
            let clearer = {
                let state = Arc::clone(&state);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    state.clear_request();
                })
            };

            assert!(requester.join().unwrap());
            clearer.join().unwrap();

            if state.is_requested() {
                // The request landed after the clear and must stay intact.
                let info = state.reason();
                assert_eq!(info.reason, Reason::UserRequest);
                assert_eq!(info.message, "first");
                assert!(!state.request(Reason::FatalError, Some("second")));
                assert_eq!(state.reason().reason, Reason::UserRequest);
            } else {
                assert_eq!(state.reason().reason, Reason::None);
                assert!(state.request(Reason::FatalError, Some("second")));
                assert_eq!(state.reason().message, "second");
            }
        }
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(Reason::UserRequest.to_string(), "User Requested");
        assert_eq!(Reason::Sigbreak.as_str(), "SIGBREAK");
        assert_eq!(Reason::from_raw(42), Reason::Unknown);
        assert_eq!(Reason::from_raw(Reason::None.as_raw()), Reason::None);
    }
}
