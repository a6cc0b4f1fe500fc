/*
 *  lib.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Host library behind the longship binary
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

//! # longship host
//!
//! The host side of the engine core: it owns the ABI tables plugins call
//! into, coordinates shutdown and restart, and picks a platform/backend
//! pair to run the engine on.
//!
//! - [`shutdown`] - process-wide shutdown state and the signal bridge
//! - [`logging`] - `env_logger` sink behind the host logging table
//! - [`host`] - root host table handed to every plugin
//! - [`plugin`] - render plugin handshake, loader and platform adapter
//! - [`platform`] - platform/backend types and the selector
//! - [`lifecycle`] - create / run / destroy restart loop
//! - [`engine`] - the application the binary drives
//! - [`config`] - YAML + command line configuration

pub mod config;
pub mod engine;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod plugin;
pub mod shutdown;

pub use engine::{EngineApplication, EngineSettings};
pub use lifecycle::{Application, LifecycleDriver, LifecycleOutcome};
pub use shutdown::{Reason, ShutdownInfo, ShutdownState};
