/*
 *  platform/mod.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Platform / backend types and the platform manager interface
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

//! Platform layer
//!
//! A platform manager owns the windowing side (GLFW, Wayland, headless, ...)
//! glued to one rendering backend (Vulkan, null, ...). The engine never
//! constructs one directly; it asks the [`selector`] for the best match in
//! the build's candidate table.

pub mod selector;

use std::fmt;

use clap::ValueEnum;
use longship_sdk::ffi::{
    LongshipBackendType,
    LongshipPlatformType,
    LONGSHIP_BACKEND_DIRECTX_12,
    LONGSHIP_BACKEND_GNM,
    LONGSHIP_BACKEND_METAL,
    LONGSHIP_BACKEND_NO_PREFERENCE,
    LONGSHIP_BACKEND_NULL,
    LONGSHIP_BACKEND_OPENGL,
    LONGSHIP_BACKEND_UNSUPPORTED,
    LONGSHIP_BACKEND_VULKAN,
    LONGSHIP_PLATFORM_COCOA,
    LONGSHIP_PLATFORM_GLFW,
    LONGSHIP_PLATFORM_HEADLESS,
    LONGSHIP_PLATFORM_NO_PREFERENCE,
    LONGSHIP_PLATFORM_UNSUPPORTED,
    LONGSHIP_PLATFORM_WAYLAND,
    LONGSHIP_PLATFORM_WIN32,
    LONGSHIP_PLATFORM_X11,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use selector::{
    available_configurations,
    choose,
    select_platform,
    Candidate,
    CreateFn,
    SelectError,
    INVALID_SCORE,
};

/// Windowing platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformType {
    Glfw,
    Wayland,
    X11,
    Cocoa,
    Win32,
    Unsupported,
    NoPreference,
    Headless,
}

impl PlatformType {
    /// Decode a wire value, unknown codes are `Unsupported`
    pub const fn from_raw(raw: LongshipPlatformType) -> Self {
        match raw {
            LONGSHIP_PLATFORM_GLFW => PlatformType::Glfw,
            LONGSHIP_PLATFORM_WAYLAND => PlatformType::Wayland,
            LONGSHIP_PLATFORM_X11 => PlatformType::X11,
            LONGSHIP_PLATFORM_COCOA => PlatformType::Cocoa,
            LONGSHIP_PLATFORM_WIN32 => PlatformType::Win32,
            LONGSHIP_PLATFORM_NO_PREFERENCE => PlatformType::NoPreference,
            LONGSHIP_PLATFORM_HEADLESS => PlatformType::Headless,
            _ => PlatformType::Unsupported,
        }
    }

    pub const fn as_raw(self) -> LongshipPlatformType {
        match self {
            PlatformType::Glfw => LONGSHIP_PLATFORM_GLFW,
            PlatformType::Wayland => LONGSHIP_PLATFORM_WAYLAND,
            PlatformType::X11 => LONGSHIP_PLATFORM_X11,
            PlatformType::Cocoa => LONGSHIP_PLATFORM_COCOA,
            PlatformType::Win32 => LONGSHIP_PLATFORM_WIN32,
            PlatformType::Unsupported => LONGSHIP_PLATFORM_UNSUPPORTED,
            PlatformType::NoPreference => LONGSHIP_PLATFORM_NO_PREFERENCE,
            PlatformType::Headless => LONGSHIP_PLATFORM_HEADLESS,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlatformType::Glfw => "GLFW",
            PlatformType::Wayland => "Wayland",
            PlatformType::X11 => "X11",
            PlatformType::Cocoa => "Cocoa",
            PlatformType::Win32 => "Win32",
            PlatformType::Unsupported => "Unsupported",
            PlatformType::NoPreference => "No Preference",
            PlatformType::Headless => "Headless",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendType {
    Vulkan,
    Metal,
    Gnm,
    #[serde(rename = "opengl")]
    #[value(name = "opengl")]
    OpenGl,
    #[serde(rename = "directx12")]
    #[value(name = "directx12")]
    DirectX12,
    Unsupported,
    NoPreference,
    Null,
}

impl BackendType {
    /// Decode a wire value, unknown codes are `Unsupported`
    pub const fn from_raw(raw: LongshipBackendType) -> Self {
        match raw {
            LONGSHIP_BACKEND_VULKAN => BackendType::Vulkan,
            LONGSHIP_BACKEND_METAL => BackendType::Metal,
            LONGSHIP_BACKEND_GNM => BackendType::Gnm,
            LONGSHIP_BACKEND_OPENGL => BackendType::OpenGl,
            LONGSHIP_BACKEND_DIRECTX_12 => BackendType::DirectX12,
            LONGSHIP_BACKEND_NO_PREFERENCE => BackendType::NoPreference,
            LONGSHIP_BACKEND_NULL => BackendType::Null,
            _ => BackendType::Unsupported,
        }
    }

    pub const fn as_raw(self) -> LongshipBackendType {
        match self {
            BackendType::Vulkan => LONGSHIP_BACKEND_VULKAN,
            BackendType::Metal => LONGSHIP_BACKEND_METAL,
            BackendType::Gnm => LONGSHIP_BACKEND_GNM,
            BackendType::OpenGl => LONGSHIP_BACKEND_OPENGL,
            BackendType::DirectX12 => LONGSHIP_BACKEND_DIRECTX_12,
            BackendType::Unsupported => LONGSHIP_BACKEND_UNSUPPORTED,
            BackendType::NoPreference => LONGSHIP_BACKEND_NO_PREFERENCE,
            BackendType::Null => LONGSHIP_BACKEND_NULL,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BackendType::Vulkan => "Vulkan",
            BackendType::Metal => "Metal",
            BackendType::Gnm => "GNM",
            BackendType::OpenGl => "OpenGL",
            BackendType::DirectX12 => "DirectX 12",
            BackendType::Unsupported => "Unsupported",
            BackendType::NoPreference => "No Preference",
            BackendType::Null => "Null",
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired platform/backend pair; either side may be `NoPreference`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRequest {
    pub platform: PlatformType,
    pub backend: BackendType,
}

impl PlatformRequest {
    pub const ANY: PlatformRequest = PlatformRequest {
        platform: PlatformType::NoPreference,
        backend: BackendType::NoPreference,
    };

    pub const fn new(platform: PlatformType, backend: BackendType) -> Self {
        Self { platform, backend }
    }
}

impl Default for PlatformRequest {
    fn default() -> Self {
        Self::ANY
    }
}

#[derive(Debug, Clone)]
pub struct WindowCreateInfo {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowCreateInfo {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "longship".to_string(),
        }
    }
}

/// Handle to a window owned by a platform manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub usize);

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    #[error("no such window: {0:?}")]
    UnknownWindow(WindowId),

    #[error("renderer error: {0}")]
    Renderer(String),
}

/// A windowing platform glued to a rendering backend
///
/// Implemented in-process or by [`PluginPlatform`](crate::plugin::PluginPlatform)
/// over a render plugin's table.
pub trait PlatformManager {
    fn platform_type(&self) -> PlatformType;
    fn backend_type(&self) -> BackendType;

    /// Human readable name, for logs
    fn name(&self) -> &str;

    fn create_window(&mut self, info: &WindowCreateInfo) -> Result<WindowId, PlatformError>;

    /// Create the RHI and a swapchain for `window`.
    ///
    /// `Ok(false)` when the backend has no renderer to attach.
    fn attach_renderer(&mut self, window: WindowId) -> Result<bool, PlatformError>;

    fn poll_events(&mut self);

    /// Present every attached swapchain
    fn present(&mut self) -> Result<(), PlatformError>;
}

impl fmt::Debug for dyn PlatformManager + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformManager")
            .field("name", &self.name())
            .field("platform", &self.platform_type())
            .field("backend", &self.backend_type())
            .finish()
    }
}
