/*
 *  plugin/adapter.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Plugin adapter - drives a render plugin's table as a PlatformManager
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

use std::ffi::CString;
use std::ptr::{self, NonNull};

use longship_sdk::ffi::{
    struct_size_of,
    LongshipPlatformHandle,
    LongshipRhiHandle,
    LongshipSwapchainHandle,
    LongshipWindowCreateInfo,
    LongshipWindowHandle,
};
use longship_sdk::{debug, warn};

use super::{catch_ffi_call, PluginError, RenderPlugin};
use crate::logging::Renderer;
use crate::platform::{
    BackendType,
    PlatformError,
    PlatformManager,
    PlatformType,
    WindowCreateInfo,
    WindowId,
};

/// Handles created for one window. RHI and swapchain stay null when the
/// plugin lacks those capabilities.
struct PluginWindow {
    window: NonNull<LongshipWindowHandle>,
    rhi: *mut LongshipRhiHandle,
    swapchain: *mut LongshipSwapchainHandle,
}

/// Platform manager backed by a render plugin
///
/// Owns every handle it creates and destroys them in reverse order on drop:
/// swapchain, RHI, window, then the platform itself.
pub struct PluginPlatform {
    windows: Vec<PluginWindow>,
    platform: NonNull<LongshipPlatformHandle>,
    name: String,

    // Declared last so the library outlives every handle above.
    plugin: RenderPlugin,
}

impl PluginPlatform {
    /// Create the plugin's platform instance
    pub fn new(plugin: RenderPlugin) -> Result<Self, PluginError> {
        // Validated during the handshake.
        let create = plugin.table().create_platform.ok_or(PluginError::NullResult {
            plugin: plugin.name().to_string(),
            function: "create_platform",
        })?;

        let handle = catch_ffi_call(|| create())?;
        let platform = NonNull::new(handle).ok_or_else(|| PluginError::NullResult {
            plugin: plugin.name().to_string(),
            function: "create_platform",
        })?;

        debug!(Renderer, "Created plugin platform instance: {:p}", handle);

        Ok(Self {
            windows: Vec::new(),
            platform,
            name: plugin.name().to_string(),
            plugin,
        })
    }

    pub fn plugin(&self) -> &RenderPlugin {
        &self.plugin
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    fn window(&self, id: WindowId) -> Result<&PluginWindow, PlatformError> {
        self.windows.get(id.0).ok_or(PlatformError::UnknownWindow(id))
    }
}

impl PlatformManager for PluginPlatform {
    fn platform_type(&self) -> PlatformType {
        self.plugin.metadata().platform
    }

    fn backend_type(&self) -> BackendType {
        self.plugin.metadata().backend
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create_window(&mut self, info: &WindowCreateInfo) -> Result<WindowId, PlatformError> {
        let Some(create) = self.plugin.table().create_window else {
            return Err(PlatformError::WindowCreation("plugin cannot create windows".into()));
        };

        let title = CString::new(info.title.as_str())
            .map_err(|_| PlatformError::WindowCreation("window title contains a NUL byte".into()))?;
        let ffi_info = LongshipWindowCreateInfo {
            struct_size: struct_size_of::<LongshipWindowCreateInfo>(),
            width: info.width,
            height: info.height,
            title: title.as_ptr(),
        };

        let platform = self.platform.as_ptr();
        let handle = catch_ffi_call(|| create(platform, &ffi_info))
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        let window = NonNull::new(handle)
            .ok_or_else(|| PlatformError::WindowCreation(format!("{} returned no window", self.name)))?;

        debug!(Renderer, "Created window {}x{} '{}'", info.width, info.height, info.title);

        self.windows.push(PluginWindow {
            window,
            rhi: ptr::null_mut(),
            swapchain: ptr::null_mut(),
        });
        Ok(WindowId(self.windows.len() - 1))
    }

    fn attach_renderer(&mut self, id: WindowId) -> Result<bool, PlatformError> {
        let table = self.plugin.table();
        let platform = self.platform.as_ptr();
        let window = self.window(id)?.window.as_ptr();

        if !self.window(id)?.rhi.is_null() {
            return Ok(true);
        }

        let Some(create_rhi) = table.create_rhi else {
            debug!(Renderer, "{} has no RHI, running without a renderer", self.name);
            return Ok(false);
        };

        let rhi = catch_ffi_call(|| create_rhi(platform, window)).map_err(|e| PlatformError::Renderer(e.to_string()))?;
        if rhi.is_null() {
            return Err(PlatformError::Renderer(format!("{} failed to create an RHI", self.name)));
        }

        let mut swapchain = ptr::null_mut();
        if let Some(create_swapchain) = table.create_swapchain {
            swapchain = catch_ffi_call(|| create_swapchain(platform, rhi, window)).unwrap_or(ptr::null_mut());
            if swapchain.is_null() {
                if let Some(destroy_rhi) = table.destroy_rhi {
                    let _ = catch_ffi_call(|| destroy_rhi(platform, rhi));
                }
                return Err(PlatformError::Renderer(format!("{} failed to create a swapchain", self.name)));
            }
        }

        let entry = &mut self.windows[id.0];
        entry.rhi = rhi;
        entry.swapchain = swapchain;
        Ok(true)
    }

    fn poll_events(&mut self) {
        if let Some(poll) = self.plugin.table().poll_events {
            let platform = self.platform.as_ptr();
            let _ = catch_ffi_call(|| poll(platform));
        }
    }

    fn present(&mut self) -> Result<(), PlatformError> {
        let Some(present) = self.plugin.table().present_swapchain else {
            return Ok(());
        };

        let platform = self.platform.as_ptr();
        for entry in self.windows.iter().filter(|w| !w.swapchain.is_null()) {
            catch_ffi_call(|| present(platform, entry.rhi, entry.swapchain))
                .map_err(|e| PlatformError::Renderer(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for PluginPlatform {
    fn drop(&mut self) {
        let table = self.plugin.table();
        let platform = self.platform.as_ptr();

        for entry in self.windows.drain(..).rev() {
            if !entry.swapchain.is_null() {
                match table.destroy_swapchain {
                    Some(destroy) => {
                        let _ = catch_ffi_call(|| destroy(platform, entry.rhi, entry.swapchain));
                    }
                    None => warn!(Renderer, "{} cannot destroy swapchains, leaking one", self.name),
                }
            }

            if !entry.rhi.is_null() {
                match table.destroy_rhi {
                    Some(destroy) => {
                        let _ = catch_ffi_call(|| destroy(platform, entry.rhi));
                    }
                    None => warn!(Renderer, "{} cannot destroy its RHI, leaking one", self.name),
                }
            }

            if let Some(destroy) = table.destroy_window {
                let _ = catch_ffi_call(|| destroy(platform, entry.window.as_ptr()));
            }
        }

        debug!(Renderer, "Destroying plugin platform instance: {:p}", platform);
        if let Some(destroy) = table.destroy_platform {
            let _ = catch_ffi_call(|| destroy(platform));
        }
    }
}

#[cfg(all(test, feature = "headless"))]
mod tests {
    use super::*;
    use crate::plugin::headless_test_lock;
    use longship_render_headless::{live_handles, longship_plugin_init, longship_render_plugin_api};

    fn headless() -> PluginPlatform {
        let plugin = unsafe { RenderPlugin::from_static(longship_plugin_init, longship_render_plugin_api) }.unwrap();
        PluginPlatform::new(plugin).unwrap()
    }

    #[test]
    fn test_window_renderer_and_teardown() {
        let _serial = headless_test_lock();
        let before = live_handles();
        let mut platform = headless();
        assert_eq!(platform.platform_type(), PlatformType::Headless);
        assert_eq!(platform.backend_type(), BackendType::Null);

        let window = platform.create_window(&WindowCreateInfo::default()).unwrap();
        assert!(platform.attach_renderer(window).unwrap());
        assert!(platform.attach_renderer(window).unwrap());

        platform.poll_events();
        platform.present().unwrap();
        assert_eq!(platform.window_count(), 1);

        assert_eq!(live_handles(), before + 4);
        drop(platform);
        assert_eq!(live_handles(), before);
    }

    #[test]
    fn test_teardown_without_renderer() {
        let _serial = headless_test_lock();
        let before = live_handles();
        let mut platform = headless();

        platform.create_window(&WindowCreateInfo::default()).unwrap();
        platform.create_window(&WindowCreateInfo::default()).unwrap();
        assert_eq!(live_handles(), before + 3);

        drop(platform);
        assert_eq!(live_handles(), before);
    }

    #[test]
    fn test_unknown_window() {
        let _serial = headless_test_lock();
        let mut platform = headless();
        let result = platform.attach_renderer(WindowId(3));
        assert!(matches!(result, Err(PlatformError::UnknownWindow(WindowId(3)))));
    }

    #[test]
    fn test_nul_in_title_is_rejected() {
        let _serial = headless_test_lock();
        let mut platform = headless();
        let info = WindowCreateInfo {
            title: "bad\0title".into(),
            ..WindowCreateInfo::default()
        };
        assert!(platform.create_window(&info).is_err());
        assert_eq!(platform.window_count(), 0);
    }
}
