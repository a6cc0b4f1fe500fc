/*
 *  longship-sdk/src/lib.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Shared ABI definitions for the longship host and its plugins
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

//! longship SDK
//!
//! Linked statically into the host and into every plugin, so each binary
//! image gets its own copy of the logging slot.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  host (longship)             │  owns every table
//! │   LongshipHostVTable ──┐     │
//! └────────────────────────┼─────┘
//!                          │ longship_plugin_init(host)
//! ┌────────────────────────▼─────┐
//! │  plugin (cdylib)             │
//! │   abi::validate → log::install│
//! │   longship_render_plugin_api │
//! └──────────────────────────────┘
//! ```
//!
//! - [`ffi`]: `#[repr(C)]` tables, wire codes and exported symbol names
//! - [`abi`]: the validation every consumer runs before using a table
//! - [`log`]: per-binary logging indirection and the logging macros

pub mod abi;
pub mod ffi;
pub mod log;

pub use abi::{AbiError, AbiTable};
pub use log::{Category, LevelGuard, LogLevel, LoggingSlot};
