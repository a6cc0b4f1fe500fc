/*
 *  longship-render-headless/src/plugin.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Headless platform, window, RHI and swapchain behind the render table
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

use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use longship_sdk::abi;
use longship_sdk::ffi::*;
use longship_sdk::{debug, error, info, trace, warn};

longship_sdk::category!(Headless = "Headless");

const PLUGIN_NAME: &CStr = c"headless";
const PLUGIN_VERSION: u32 = 1;

/// Handles currently alive across all platform instances
static LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);

/// Number of platform, window, RHI and swapchain handles not yet destroyed
pub fn live_handles() -> usize {
    LIVE_HANDLES.load(Ordering::Acquire)
}

struct HeadlessPlatform {
    polls: u64,
}

struct HeadlessWindow {
    width: u32,
    height: u32,
    title: String,
}

struct HeadlessRhi {
    width: u32,
    height: u32,
}

struct HeadlessSwapchain {
    frames: u64,
}

fn into_handle<T, H>(value: T) -> *mut H {
    LIVE_HANDLES.fetch_add(1, Ordering::AcqRel);
    Box::into_raw(Box::new(value)) as *mut H
}

/// # Safety
///
/// `handle` must be null or come from `into_handle::<T, _>` and not be
/// released yet.
unsafe fn release_handle<T, H>(handle: *mut H) {
    if !handle.is_null() {
        drop(unsafe { Box::from_raw(handle as *mut T) });
        LIVE_HANDLES.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Macro to catch panics in FFI functions
macro_rules! catch_panic {
    ($fallback:expr, $code:block) => {
        match catch_unwind(AssertUnwindSafe(|| $code)) {
            Ok(result) => result,
            Err(panic_info) => {
                let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown error".to_string()
                };
                error!(Headless, "Plugin panic: {}", message);
                $fallback
            }
        }
    };
}

// ============================================================================
// Plugin entry points
// ============================================================================

/// Accept the host table and adopt its logging table.
///
/// Returns false only when the host table itself is unusable. A host
/// without a usable logging table still initializes, with logging off.
///
/// # Safety
///
/// `host` must be null or point to a host table that outlives the plugin.
#[no_mangle]
pub unsafe extern "C" fn longship_plugin_init(host: *const LongshipHostVTable) -> bool {
    catch_panic!(false, {
        let host = match unsafe { abi::validate(host) } {
            Ok(host) => host,
            Err(_) => return false,
        };

        // A rejected logging table leaves this binary silent.
        if unsafe { longship_sdk::log::install(host.logging) }.is_ok() {
            debug!(Headless, "Headless render plugin v{} initialized", PLUGIN_VERSION);
        }
        true
    })
}

/// Hand out the render table for `requested_abi_version`, or null
#[no_mangle]
pub extern "C" fn longship_render_plugin_api(requested_abi_version: u32) -> *const LongshipRenderVTable {
    if requested_abi_version != LONGSHIP_RENDER_ABI_VERSION {
        warn!(
            Headless,
            "Render ABI v{} requested, only v{} is provided",
            requested_abi_version,
            LONGSHIP_RENDER_ABI_VERSION
        );
        return ptr::null();
    }
    &RENDER_API
}

static RENDER_API: LongshipRenderVTable = LongshipRenderVTable {
    abi_version: LONGSHIP_RENDER_ABI_VERSION,
    struct_size: struct_size_of::<LongshipRenderVTable>(),
    plugin_version: PLUGIN_VERSION,
    plugin_name: PLUGIN_NAME.as_ptr(),
    backend_type: LONGSHIP_BACKEND_NULL,
    platform_type: LONGSHIP_PLATFORM_HEADLESS,
    create_platform: Some(create_platform),
    destroy_platform: Some(destroy_platform),
    create_window: Some(create_window),
    destroy_window: Some(destroy_window),
    poll_events: Some(poll_events),
    create_rhi: Some(create_rhi),
    destroy_rhi: Some(destroy_rhi),
    create_swapchain: Some(create_swapchain),
    destroy_swapchain: Some(destroy_swapchain),
    present_swapchain: Some(present_swapchain),
};

// ============================================================================
// Render table implementation
// ============================================================================

extern "C" fn create_platform() -> *mut LongshipPlatformHandle {
    catch_panic!(ptr::null_mut(), {
        info!(Headless, "Creating headless platform");
        into_handle(HeadlessPlatform { polls: 0 })
    })
}

extern "C" fn destroy_platform(platform: *mut LongshipPlatformHandle) {
    catch_panic!((), {
        if let Some(p) = unsafe { (platform as *const HeadlessPlatform).as_ref() } {
            debug!(Headless, "Destroying headless platform after {} polls", p.polls);
        }
        unsafe { release_handle::<HeadlessPlatform, _>(platform) }
    })
}

extern "C" fn create_window(
    platform: *mut LongshipPlatformHandle,
    info: *const LongshipWindowCreateInfo,
) -> *mut LongshipWindowHandle {
    catch_panic!(ptr::null_mut(), {
        if platform.is_null() || info.is_null() {
            error!(Headless, "Null pointer passed to create_window");
            return ptr::null_mut();
        }

        let info = unsafe { &*info };
        if (info.struct_size as usize) < std::mem::size_of::<LongshipWindowCreateInfo>() {
            error!(Headless, "Window create info too small: {} bytes", info.struct_size);
            return ptr::null_mut();
        }

        let title = if info.title.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(info.title as *const c_char) }
                .to_string_lossy()
                .into_owned()
        };

        info!(Headless, "Creating headless window {}x{} '{}'", info.width, info.height, title);
        into_handle(HeadlessWindow {
            width: info.width,
            height: info.height,
            title,
        })
    })
}

extern "C" fn destroy_window(_platform: *mut LongshipPlatformHandle, window: *mut LongshipWindowHandle) {
    catch_panic!((), {
        if let Some(w) = unsafe { (window as *const HeadlessWindow).as_ref() } {
            debug!(Headless, "Destroying headless window '{}'", w.title);
        }
        unsafe { release_handle::<HeadlessWindow, _>(window) }
    })
}

extern "C" fn poll_events(platform: *mut LongshipPlatformHandle) {
    catch_panic!((), {
        // No event sources, just count the pump.
        if let Some(p) = unsafe { (platform as *mut HeadlessPlatform).as_mut() } {
            p.polls += 1;
        }
    })
}

extern "C" fn create_rhi(
    _platform: *mut LongshipPlatformHandle,
    window: *mut LongshipWindowHandle,
) -> *mut LongshipRhiHandle {
    catch_panic!(ptr::null_mut(), {
        let Some(w) = (unsafe { (window as *const HeadlessWindow).as_ref() }) else {
            error!(Headless, "Null window passed to create_rhi");
            return ptr::null_mut();
        };

        debug!(Headless, "Creating null RHI for {}x{}", w.width, w.height);
        into_handle(HeadlessRhi {
            width: w.width,
            height: w.height,
        })
    })
}

extern "C" fn destroy_rhi(_platform: *mut LongshipPlatformHandle, rhi: *mut LongshipRhiHandle) {
    catch_panic!((), { unsafe { release_handle::<HeadlessRhi, _>(rhi) } })
}

extern "C" fn create_swapchain(
    _platform: *mut LongshipPlatformHandle,
    rhi: *mut LongshipRhiHandle,
    window: *mut LongshipWindowHandle,
) -> *mut LongshipSwapchainHandle {
    catch_panic!(ptr::null_mut(), {
        let Some(r) = (unsafe { (rhi as *const HeadlessRhi).as_ref() }) else {
            error!(Headless, "Null RHI passed to create_swapchain");
            return ptr::null_mut();
        };
        if window.is_null() {
            error!(Headless, "Null window passed to create_swapchain");
            return ptr::null_mut();
        }

        debug!(Headless, "Creating null swapchain {}x{}", r.width, r.height);
        into_handle(HeadlessSwapchain { frames: 0 })
    })
}

extern "C" fn destroy_swapchain(
    _platform: *mut LongshipPlatformHandle,
    _rhi: *mut LongshipRhiHandle,
    swapchain: *mut LongshipSwapchainHandle,
) {
    catch_panic!((), {
        if let Some(s) = unsafe { (swapchain as *const HeadlessSwapchain).as_ref() } {
            debug!(Headless, "Destroying null swapchain after {} frames", s.frames);
        }
        unsafe { release_handle::<HeadlessSwapchain, _>(swapchain) }
    })
}

extern "C" fn present_swapchain(
    _platform: *mut LongshipPlatformHandle,
    _rhi: *mut LongshipRhiHandle,
    swapchain: *mut LongshipSwapchainHandle,
) {
    catch_panic!((), {
        if let Some(s) = unsafe { (swapchain as *mut HeadlessSwapchain).as_mut() } {
            s.frames += 1;
            trace!(Headless, "Presented frame {}", s.frames);
        }
    })
}
