/*
 *  lifecycle.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Create / run / destroy restart loop around the application
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

//! Lifecycle driver
//!
//! Each iteration creates an application, runs it until it returns, reads
//! the shutdown state, drops the application and clears the state. A
//! restart reason starts the next iteration; anything else ends the loop.
//! The request is cleared every time, so no stale reason leaks into the
//! next instance.

use longship_sdk::{info, warn, LevelGuard};

use crate::logging::EntryPoint;
use crate::shutdown::{self, Reason, ShutdownInfo, ShutdownState};

/// The application collaborator driven by [`LifecycleDriver`]
pub trait Application {
    /// Run until the application decides to stop, usually after it sees a
    /// shutdown request.
    fn run(&mut self);
}

/// How the restart loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    /// Application instances created
    pub runs: u32,
    /// Reason observed after the last run
    pub final_reason: ShutdownInfo,
}

pub struct LifecycleDriver<'a> {
    state: &'a ShutdownState,
    max_restarts: Option<u32>,
}

impl LifecycleDriver<'static> {
    /// Driver bound to the process-wide shutdown state
    pub fn global() -> Self {
        LifecycleDriver::new(shutdown::global())
    }
}

impl<'a> LifecycleDriver<'a> {
    pub fn new(state: &'a ShutdownState) -> Self {
        Self {
            state,
            max_restarts: None,
        }
    }

    /// Stop restarting after `max` restarts; `None` is unlimited
    pub fn with_max_restarts(mut self, max: Option<u32>) -> Self {
        self.max_restarts = max;
        self
    }

    /// Drive applications made by `create` until one ends without a restart
    pub fn run<A, F>(&self, mut create: F) -> LifecycleOutcome
    where
        A: Application,
        F: FnMut() -> A,
    {
        let mut runs = 0u32;

        loop {
            runs += 1;

            let mut application = {
                let _level = LevelGuard::save();
                info!(EntryPoint, "Starting new application (run {})", runs);
                create()
            };

            {
                let _level = LevelGuard::save();
                info!(EntryPoint, "Application created, running");
                application.run();
            }

            let (restart, final_reason) = {
                let _level = LevelGuard::save();
                info!(EntryPoint, "Application finished, determining if it should restart");
                self.inspect()
            };

            {
                let _level = LevelGuard::save();
                info!(EntryPoint, "Deleting application");
                drop(application);
            }

            self.state.clear_request();

            if !restart {
                info!(EntryPoint, "Exiting, no restart requested");
                return LifecycleOutcome { runs, final_reason };
            }

            if let Some(max) = self.max_restarts {
                if runs > max {
                    warn!(EntryPoint, "Restart limit of {} reached, exiting", max);
                    return LifecycleOutcome { runs, final_reason };
                }
            }

            info!(EntryPoint, "Restarting after application was deleted");
        }
    }

    fn inspect(&self) -> (bool, ShutdownInfo) {
        if !self.state.is_requested() {
            warn!(EntryPoint, "Application returned without a shutdown request");
            return (
                false,
                ShutdownInfo {
                    reason: Reason::None,
                    message: "application returned without a shutdown request".to_string(),
                },
            );
        }

        let restart = self.state.restart_requested();
        let info = self.state.reason();
        info!(
            EntryPoint,
            "Shutdown reason: {} ({}). Restart: {}",
            info.reason,
            info.message,
            restart
        );
        (restart, info)
    }
}
