/*
 *  longship-sdk/src/ffi.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  C ABI tables shared between the host and plugins
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

//! FFI types for the longship host/plugin boundary
//!
//! Every type in this module is `#[repr(C)]` and forms the stable ABI between
//! the host executable and independently compiled plugins.
//!
//! ## Stability rules
//!
//! - Fields are never reordered or removed. New fields are appended.
//! - Every table starts with `abi_version` and `struct_size`. Consumers check
//!   both before touching any other field (see [`crate::abi`]).
//! - Function pointers are `Option<extern "C" fn>` so a missing entry is a
//!   null pointer on the wire and `None` on the Rust side.
//! - Enumerations travel as plain `u32` codes. The receiving side maps codes
//!   it does not know to a safe value instead of transmuting them.
//! - The host owns every table. Plugins keep non-owning pointers that stay
//!   valid for the lifetime of the process.

use std::ffi::c_char;
use std::mem::{offset_of, size_of};

/// Logging table ABI version
pub const LONGSHIP_LOGGING_ABI_VERSION: u32 = 1;

/// Root host table ABI version
pub const LONGSHIP_HOST_ABI_VERSION: u32 = 1;

/// Render plugin table ABI version
pub const LONGSHIP_RENDER_ABI_VERSION: u32 = 1;

/// Symbol every plugin exports to receive the root host table
pub const LONGSHIP_PLUGIN_INIT_SYMBOL: &[u8] = b"longship_plugin_init\0";

/// Symbol a render plugin exports to hand out its render table
pub const LONGSHIP_RENDER_API_SYMBOL: &[u8] = b"longship_render_plugin_api\0";

// ============================================================================
// Wire codes
// ============================================================================

/// Log severity code (`LONGSHIP_LOG_*`)
pub type LongshipLogLevel = u32;

pub const LONGSHIP_LOG_TRACE: LongshipLogLevel = 0;
pub const LONGSHIP_LOG_DEBUG: LongshipLogLevel = 1;
pub const LONGSHIP_LOG_INFO: LongshipLogLevel = 2;
pub const LONGSHIP_LOG_WARN: LongshipLogLevel = 3;
pub const LONGSHIP_LOG_ERROR: LongshipLogLevel = 4;
pub const LONGSHIP_LOG_CRITICAL: LongshipLogLevel = 5;
pub const LONGSHIP_LOG_OFF: LongshipLogLevel = 6;

/// Windowing platform code (`LONGSHIP_PLATFORM_*`)
pub type LongshipPlatformType = u32;

pub const LONGSHIP_PLATFORM_GLFW: LongshipPlatformType = 0;
pub const LONGSHIP_PLATFORM_WAYLAND: LongshipPlatformType = 1;
pub const LONGSHIP_PLATFORM_X11: LongshipPlatformType = 2;
pub const LONGSHIP_PLATFORM_COCOA: LongshipPlatformType = 3;
pub const LONGSHIP_PLATFORM_WIN32: LongshipPlatformType = 4;
pub const LONGSHIP_PLATFORM_UNSUPPORTED: LongshipPlatformType = 5;
pub const LONGSHIP_PLATFORM_NO_PREFERENCE: LongshipPlatformType = 6;
pub const LONGSHIP_PLATFORM_HEADLESS: LongshipPlatformType = 7;

/// Render backend code (`LONGSHIP_BACKEND_*`)
pub type LongshipBackendType = u32;

pub const LONGSHIP_BACKEND_VULKAN: LongshipBackendType = 0;
pub const LONGSHIP_BACKEND_METAL: LongshipBackendType = 1;
pub const LONGSHIP_BACKEND_GNM: LongshipBackendType = 2;
pub const LONGSHIP_BACKEND_OPENGL: LongshipBackendType = 3;
pub const LONGSHIP_BACKEND_DIRECTX_12: LongshipBackendType = 4;
pub const LONGSHIP_BACKEND_UNSUPPORTED: LongshipBackendType = 5;
pub const LONGSHIP_BACKEND_NO_PREFERENCE: LongshipBackendType = 6;
pub const LONGSHIP_BACKEND_NULL: LongshipBackendType = 7;

// ============================================================================
// Logging table
// ============================================================================

/// Emit one fully formatted message.
///
/// All strings are NUL-terminated UTF-8 and valid for the duration of the
/// call only. The host copies anything it needs to keep.
pub type LogMessageFn = extern "C" fn(
    level: LongshipLogLevel,
    category: *const c_char,
    file: *const c_char,
    line: i32,
    function: *const c_char,
    message: *const c_char,
);

/// Read the host's global log level
pub type GetGlobalLogLevelFn = extern "C" fn() -> LongshipLogLevel;

/// Replace the host's global log level
pub type SetGlobalLogLevelFn = extern "C" fn(level: LongshipLogLevel);

/// Logging services provided by the host
#[repr(C)]
pub struct LongshipLoggingVTable {
    /// Breaking-change counter, must equal [`LONGSHIP_LOGGING_ABI_VERSION`]
    pub abi_version: u32,

    /// Byte size of the table instance the host handed out
    pub struct_size: u32,

    pub log_message: Option<LogMessageFn>,
    pub get_global_log_level: Option<GetGlobalLogLevelFn>,
    pub set_global_log_level: Option<SetGlobalLogLevelFn>,
}

impl LongshipLoggingVTable {
    /// Smallest table this build can consume
    pub const MIN_SIZE: usize =
        offset_of!(LongshipLoggingVTable, set_global_log_level) + size_of::<Option<SetGlobalLogLevelFn>>();
}

// ============================================================================
// Root host table
// ============================================================================

/// Root table the host passes to every plugin's init entry point
#[repr(C)]
pub struct LongshipHostVTable {
    pub abi_version: u32,
    pub struct_size: u32,

    /// Host logging table. May be null when the host provides no logging.
    pub logging: *const LongshipLoggingVTable,
    // New host services are appended below this line.
}

// SAFETY: the table is immutable after construction and the pointee is a
// host-owned static that is itself immutable.
unsafe impl Sync for LongshipHostVTable {}

impl LongshipHostVTable {
    pub const MIN_SIZE: usize =
        offset_of!(LongshipHostVTable, logging) + size_of::<*const LongshipLoggingVTable>();
}

/// Plugin initialization entry point, exported as `longship_plugin_init`
pub type PluginInitFn = unsafe extern "C" fn(host: *const LongshipHostVTable) -> bool;

// ============================================================================
// Render plugin table
// ============================================================================

/// Opaque platform instance owned by a render plugin
#[repr(C)]
pub struct LongshipPlatformHandle {
    _private: [u8; 0],
}

/// Opaque window owned by a render plugin
#[repr(C)]
pub struct LongshipWindowHandle {
    _private: [u8; 0],
}

/// Opaque rendering hardware interface owned by a render plugin
#[repr(C)]
pub struct LongshipRhiHandle {
    _private: [u8; 0],
}

/// Opaque swapchain owned by a render plugin
#[repr(C)]
pub struct LongshipSwapchainHandle {
    _private: [u8; 0],
}

/// Window creation parameters
#[repr(C)]
pub struct LongshipWindowCreateInfo {
    pub struct_size: u32,
    pub width: u32,
    pub height: u32,

    /// NUL-terminated UTF-8 title, valid for the duration of the call
    pub title: *const c_char,
}

pub type CreatePlatformFn = extern "C" fn() -> *mut LongshipPlatformHandle;
pub type DestroyPlatformFn = extern "C" fn(platform: *mut LongshipPlatformHandle);
pub type CreateWindowFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    info: *const LongshipWindowCreateInfo,
) -> *mut LongshipWindowHandle;
pub type DestroyWindowFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    window: *mut LongshipWindowHandle,
);
pub type PollEventsFn = extern "C" fn(platform: *mut LongshipPlatformHandle);
pub type CreateRhiFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    window: *mut LongshipWindowHandle,
) -> *mut LongshipRhiHandle;
pub type DestroyRhiFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    rhi: *mut LongshipRhiHandle,
);
pub type CreateSwapchainFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    rhi: *mut LongshipRhiHandle,
    window: *mut LongshipWindowHandle,
) -> *mut LongshipSwapchainHandle;
pub type DestroySwapchainFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    rhi: *mut LongshipRhiHandle,
    swapchain: *mut LongshipSwapchainHandle,
);
pub type PresentSwapchainFn = extern "C" fn(
    platform: *mut LongshipPlatformHandle,
    rhi: *mut LongshipRhiHandle,
    swapchain: *mut LongshipSwapchainHandle,
);

/// Render plugin table - platform, window, RHI and swapchain entry points
#[repr(C)]
pub struct LongshipRenderVTable {
    pub abi_version: u32,
    pub struct_size: u32,

    /// Plugin's own version number
    pub plugin_version: u32,

    /// NUL-terminated plugin name, static for the plugin's lifetime
    pub plugin_name: *const c_char,

    pub backend_type: LongshipBackendType,
    pub platform_type: LongshipPlatformType,

    pub create_platform: Option<CreatePlatformFn>,
    pub destroy_platform: Option<DestroyPlatformFn>,

    pub create_window: Option<CreateWindowFn>,
    pub destroy_window: Option<DestroyWindowFn>,
    pub poll_events: Option<PollEventsFn>,

    pub create_rhi: Option<CreateRhiFn>,
    pub destroy_rhi: Option<DestroyRhiFn>,

    pub create_swapchain: Option<CreateSwapchainFn>,
    pub destroy_swapchain: Option<DestroySwapchainFn>,
    pub present_swapchain: Option<PresentSwapchainFn>,
}

// SAFETY: render tables are immutable statics inside the plugin image and
// `plugin_name` points at static data.
unsafe impl Sync for LongshipRenderVTable {}

impl LongshipRenderVTable {
    pub const MIN_SIZE: usize =
        offset_of!(LongshipRenderVTable, present_swapchain) + size_of::<Option<PresentSwapchainFn>>();
}

/// Render plugin query function, exported as `longship_render_plugin_api`.
///
/// Returns null when the plugin does not implement `requested_abi_version`.
pub type RenderPluginApiFn = unsafe extern "C" fn(requested_abi_version: u32) -> *const LongshipRenderVTable;

/// Byte size of a table as carried in its `struct_size` field
pub const fn struct_size_of<T>() -> u32 {
    size_of::<T>() as u32
}
