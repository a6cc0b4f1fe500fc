/*
 *  longship-render-headless/src/lib.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Headless render plugin
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

//! # longship headless render plugin
//!
//! A render plugin with no window system and a null backend. Windows,
//! RHIs and swapchains are plain bookkeeping records, so the engine can
//! run its whole frame loop on a build server or inside tests.
//!
//! ## Features
//!
//! - Platform `headless`, backend `null`
//! - Every render table entry implemented, RHI and swapchain included
//! - Logs through the host logging table handed over at init
//!
//! ## Usage
//!
//! The host links this crate in statically by default. Built as a
//! `cdylib` it is also found by name:
//!
//! ```yaml
//! render:
//!   plugin: headless
//! ```

mod plugin;

pub use plugin::{live_handles, longship_plugin_init, longship_render_plugin_api};
