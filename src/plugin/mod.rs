/*
 *  plugin/mod.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Render plugins: handshake, loading and platform adapter
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

//! Render plugin system
//!
//! A render plugin is a binary image exporting two C entry points:
//!
//! 1. `longship_plugin_init(host)` - validates the root host table and
//!    installs the host logging table into the plugin's own logging slot
//! 2. `longship_render_plugin_api(version)` - returns the plugin's render
//!    table for that ABI version, or null
//!
//! Plugins can be linked in statically ([`RenderPlugin::from_static`]) or
//! loaded at runtime from a shared library ([`PluginLoader`], feature
//! `plugin-system`). Both go through the same handshake.
//!
//! ## Plugin Discovery
//!
//! Shared libraries are searched in the following locations (in priority order):
//!
//! 1. `$LONGSHIP_PLUGIN_PATH` (may hold several directories)
//! 2. the configured `plugin_dir`
//! 3. `./target/release/` and `./target/debug/` (development)
//! 4. `~/.local/lib/longship/plugins/` (user-local)
//! 5. `/usr/local/lib/longship/plugins/` and `/usr/lib/longship/plugins/` (system)
//!
//! ## Plugin Naming Convention
//!
//! - Linux: `liblongship_render_headless.so`
//! - macOS: `liblongship_render_headless.dylib`
//! - Windows: `longship_render_headless.dll`

pub mod adapter;
#[cfg(feature = "plugin-system")]
pub mod loader;

use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};

use longship_sdk::abi::{self, AbiError};
use longship_sdk::ffi::{
    LongshipRenderVTable,
    PluginInitFn,
    RenderPluginApiFn,
    LONGSHIP_RENDER_ABI_VERSION,
};
use longship_sdk::{debug, error, info};
use thiserror::Error;

use crate::host::host_api;
use crate::logging::Plugins;
use crate::platform::{BackendType, PlatformType};

pub use adapter::PluginPlatform;
#[cfg(feature = "plugin-system")]
pub use loader::PluginLoader;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin not found: {0}")]
    NotFound(String),

    #[cfg(feature = "plugin-system")]
    #[error("failed to load library {path}: {source}")]
    Library {
        path: std::path::PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[cfg(feature = "plugin-system")]
    #[error("plugin {plugin} does not export {symbol}: {source}")]
    MissingSymbol {
        plugin: String,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("plugin {0} rejected the host table")]
    InitRejected(String),

    #[error("plugin {plugin} does not implement render ABI version {requested}")]
    UnsupportedVersion { plugin: String, requested: u32 },

    #[error("plugin render table rejected: {0}")]
    Abi(#[from] AbiError),

    #[error("{function} returned null in plugin {plugin}")]
    NullResult { plugin: String, function: &'static str },

    #[error("plugin panicked: {0}")]
    Panic(String),
}

/// What a plugin reports about itself
#[derive(Debug, Clone)]
pub struct PluginMetadata {
    pub name: String,
    pub version: u32,
    pub platform: PlatformType,
    pub backend: BackendType,
    /// Library path, or `static` for in-process plugins
    pub origin: String,
}

/// A render plugin that passed the handshake
pub struct RenderPlugin {
    table: &'static LongshipRenderVTable,
    metadata: PluginMetadata,

    // Dropped last: `table` points into this library.
    #[cfg(feature = "plugin-system")]
    _library: Option<libloading::Library>,
}

impl RenderPlugin {
    /// Run the handshake against a plugin linked into this binary.
    ///
    /// # Safety
    ///
    /// Both entry points must follow the render plugin contract.
    pub unsafe fn from_static(init: PluginInitFn, query: RenderPluginApiFn) -> Result<Self, PluginError> {
        let (table, metadata) = unsafe { handshake("static", init, query) }?;
        Ok(Self {
            table,
            metadata,
            #[cfg(feature = "plugin-system")]
            _library: None,
        })
    }

    #[cfg(feature = "plugin-system")]
    pub(crate) fn from_library(
        library: libloading::Library,
        table: &'static LongshipRenderVTable,
        metadata: PluginMetadata,
    ) -> Self {
        Self {
            table,
            metadata,
            _library: Some(library),
        }
    }

    /// Validated render table, valid as long as `self`
    pub fn table(&self) -> &LongshipRenderVTable {
        self.table
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Functions a render table must provide; the RHI and swapchain entries are
/// optional capabilities.
fn require_core(table: &LongshipRenderVTable) -> Result<(), AbiError> {
    abi::require::<LongshipRenderVTable, _>("create_platform", table.create_platform)?;
    abi::require::<LongshipRenderVTable, _>("destroy_platform", table.destroy_platform)?;
    abi::require::<LongshipRenderVTable, _>("create_window", table.create_window)?;
    abi::require::<LongshipRenderVTable, _>("destroy_window", table.destroy_window)?;
    abi::require::<LongshipRenderVTable, _>("poll_events", table.poll_events)?;
    Ok(())
}

/// Init with the host table, query the render table, validate it.
///
/// # Safety
///
/// The entry points must stay callable, and the returned table valid, for
/// as long as the caller keeps the plugin image loaded.
pub(crate) unsafe fn handshake(
    origin: &str,
    init: PluginInitFn,
    query: RenderPluginApiFn,
) -> Result<(&'static LongshipRenderVTable, PluginMetadata), PluginError> {
    let accepted = catch_ffi_call(|| unsafe { init(host_api()) })?;
    if !accepted {
        error!(Plugins, "Plugin at {} rejected the host table", origin);
        return Err(PluginError::InitRejected(origin.to_string()));
    }

    let table = catch_ffi_call(|| unsafe { query(LONGSHIP_RENDER_ABI_VERSION) })?;
    if table.is_null() {
        error!(Plugins, "Plugin at {} has no render ABI v{}", origin, LONGSHIP_RENDER_ABI_VERSION);
        return Err(PluginError::UnsupportedVersion {
            plugin: origin.to_string(),
            requested: LONGSHIP_RENDER_ABI_VERSION,
        });
    }

    let table: &'static LongshipRenderVTable = unsafe { abi::validate(table) }?;
    require_core(table)?;

    let name = if table.plugin_name.is_null() {
        "unnamed".to_string()
    } else {
        unsafe { CStr::from_ptr(table.plugin_name) }.to_string_lossy().into_owned()
    };

    let metadata = PluginMetadata {
        name,
        version: table.plugin_version,
        platform: PlatformType::from_raw(table.platform_type),
        backend: BackendType::from_raw(table.backend_type),
        origin: origin.to_string(),
    };

    info!(
        Plugins,
        "Loaded render plugin: {} v{} ({} + {})",
        metadata.name,
        metadata.version,
        metadata.platform,
        metadata.backend
    );
    debug!(Plugins, "Render table is {} bytes", table.struct_size);

    Ok((table, metadata))
}

/// Run a call into plugin code, turning a panic into an error
pub(crate) fn catch_ffi_call<T, F>(f: F) -> Result<T, PluginError>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        error!(Plugins, "Caught panic in plugin call: {}", message);
        PluginError::Panic(message)
    })
}

/// Platform factory for the statically linked headless plugin
#[cfg(feature = "headless")]
pub fn create_headless() -> Option<Box<dyn crate::platform::PlatformManager>> {
    let plugin = unsafe {
        RenderPlugin::from_static(
            longship_render_headless::longship_plugin_init,
            longship_render_headless::longship_render_plugin_api,
        )
    };

    match plugin.and_then(PluginPlatform::new) {
        Ok(platform) => Some(Box::new(platform)),
        Err(e) => {
            error!(Plugins, "Headless platform unavailable: {}", e);
            None
        }
    }
}

/// Platform factory for the GLFW + Vulkan render plugin
#[cfg(feature = "glfw-vulkan")]
pub fn create_glfw_vulkan() -> Option<Box<dyn crate::platform::PlatformManager>> {
    match PluginLoader::load_by_name("glfw-vulkan").and_then(PluginPlatform::new) {
        Ok(platform) => Some(Box::new(platform)),
        Err(e) => {
            error!(Plugins, "GLFW + Vulkan platform unavailable: {}", e);
            None
        }
    }
}

/// Serializes tests that count the headless plugin's live handles
#[cfg(all(test, feature = "headless"))]
pub(crate) fn headless_test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
