/*
 *  plugin/loader.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Plugin loader - discovers and loads .so/.dylib/.dll render plugins
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

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use libloading::{Library, Symbol};
use longship_sdk::ffi::{
    PluginInitFn,
    RenderPluginApiFn,
    LONGSHIP_PLUGIN_INIT_SYMBOL,
    LONGSHIP_RENDER_API_SYMBOL,
};
use longship_sdk::{debug, info};

use super::{handshake, PluginError, RenderPlugin};
use crate::logging::Plugins;

/// Environment variable holding extra plugin directories
pub const PLUGIN_PATH_ENV: &str = "LONGSHIP_PLUGIN_PATH";

static CONFIGURED_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Plugin loader - searches for and loads render plugins
pub struct PluginLoader;

impl PluginLoader {
    /// Add the configured plugin directory to the search. First call wins.
    pub fn set_plugin_dir(dir: PathBuf) {
        let _ = CONFIGURED_DIR.set(dir);
    }

    /// Get the search paths for plugins in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Environment variable override
        if let Some(value) = std::env::var_os(PLUGIN_PATH_ENV) {
            paths.extend(std::env::split_paths(&value));
        }

        // 2. Configured directory
        if let Some(dir) = CONFIGURED_DIR.get() {
            paths.push(dir.clone());
        }

        // 3. Development directories (relative to cwd)
        paths.push(PathBuf::from("./target/release"));
        paths.push(PathBuf::from("./target/debug"));

        // 4. User-local directory
        if let Some(home) = dirs_next::home_dir() {
            paths.push(home.join(".local/lib/longship/plugins"));
        }

        // 5. System directories
        paths.push(PathBuf::from("/usr/local/lib/longship/plugins"));
        paths.push(PathBuf::from("/usr/lib/longship/plugins"));

        paths
    }

    /// Get possible library file names for a plugin name
    ///
    /// For example, for "glfw-vulkan" this returns:
    /// - Linux: ["liblongship_render_glfw_vulkan.so", "liblongship-render-glfw-vulkan.so"]
    /// - macOS: the same with `.dylib`
    /// - Windows: ["longship_render_glfw_vulkan.dll", "longship-render-glfw-vulkan.dll"]
    pub fn plugin_filenames(name: &str) -> Vec<String> {
        let snake = name.replace('-', "_");
        let kebab = name.replace('_', "-");
        let mut names = Vec::new();

        #[cfg(target_os = "linux")]
        {
            names.push(format!("liblongship_render_{}.so", snake));
            names.push(format!("liblongship-render-{}.so", kebab));
        }

        #[cfg(target_os = "macos")]
        {
            names.push(format!("liblongship_render_{}.dylib", snake));
            names.push(format!("liblongship-render-{}.dylib", kebab));
        }

        #[cfg(target_os = "windows")]
        {
            names.push(format!("longship_render_{}.dll", snake));
            names.push(format!("longship-render-{}.dll", kebab));
        }

        names
    }

    /// Find a plugin library for the given name
    pub fn find_plugin(name: &str) -> Option<PathBuf> {
        Self::find_in(&Self::search_paths(), name)
    }

    fn find_in(search_paths: &[PathBuf], name: &str) -> Option<PathBuf> {
        let filenames = Self::plugin_filenames(name);

        for path in search_paths {
            if !path.is_dir() {
                continue;
            }

            for filename in &filenames {
                let plugin_path = path.join(filename);
                if plugin_path.is_file() {
                    debug!(Plugins, "Found plugin at: {}", plugin_path.display());
                    return Some(plugin_path);
                }
            }
        }

        debug!(Plugins, "Plugin not found: {}", name);
        None
    }

    /// Load a render plugin from a specific path
    ///
    /// This performs the following steps:
    /// 1. Load the shared library
    /// 2. Resolve the init and render query symbols
    /// 3. Call init with the root host table
    /// 4. Query the render table for our ABI version
    /// 5. Validate the table and its required functions
    pub fn load_plugin<P: AsRef<Path>>(path: P) -> Result<RenderPlugin, PluginError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        info!(Plugins, "Loading plugin from: {}", origin);

        // SAFETY: loading runs the library's initializers; plugins are trusted code.
        let library = unsafe { Library::new(path) }.map_err(|source| PluginError::Library {
            path: path.to_path_buf(),
            source,
        })?;

        let init: PluginInitFn = unsafe {
            let symbol: Symbol<PluginInitFn> =
                library
                    .get(LONGSHIP_PLUGIN_INIT_SYMBOL)
                    .map_err(|source| PluginError::MissingSymbol {
                        plugin: origin.clone(),
                        symbol: "longship_plugin_init",
                        source,
                    })?;
            *symbol
        };

        let query: RenderPluginApiFn = unsafe {
            let symbol: Symbol<RenderPluginApiFn> =
                library
                    .get(LONGSHIP_RENDER_API_SYMBOL)
                    .map_err(|source| PluginError::MissingSymbol {
                        plugin: origin.clone(),
                        symbol: "longship_render_plugin_api",
                        source,
                    })?;
            *symbol
        };

        // SAFETY: `library` moves into the RenderPlugin, which keeps the
        // table and entry points alive.
        let (table, metadata) = unsafe { handshake(&origin, init, query) }?;
        Ok(RenderPlugin::from_library(library, table, metadata))
    }

    /// Load a plugin by name from the standard search paths
    pub fn load_by_name(name: &str) -> Result<RenderPlugin, PluginError> {
        let path = Self::find_plugin(name).ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        Self::load_plugin(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_search_paths() {
        let paths = PluginLoader::search_paths();
        assert!(!paths.is_empty());

        // Should always have at least the development and system paths
        assert!(paths.iter().any(|p| p.to_string_lossy().contains("target/release")));
        assert!(paths.iter().any(|p| p.to_string_lossy().contains("/usr/lib/longship/plugins")));
    }

    #[test]
    fn test_plugin_filenames() {
        let names = PluginLoader::plugin_filenames("glfw-vulkan");
        assert!(!names.is_empty());

        #[cfg(target_os = "linux")]
        {
            assert!(names.contains(&"liblongship_render_glfw_vulkan.so".to_string()));
            assert!(names.contains(&"liblongship-render-glfw-vulkan.so".to_string()));
        }

        #[cfg(target_os = "windows")]
        {
            assert!(names.contains(&"longship_render_glfw_vulkan.dll".to_string()));
        }
    }

    #[test]
    fn test_find_in_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let filename = PluginLoader::plugin_filenames("probe").remove(0);

        fs::write(second.path().join(&filename), b"").unwrap();
        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(PluginLoader::find_in(&dirs, "probe"), Some(second.path().join(&filename)));

        fs::write(first.path().join(&filename), b"").unwrap();
        assert_eq!(PluginLoader::find_in(&dirs, "probe"), Some(first.path().join(&filename)));
    }

    #[test]
    fn test_missing_plugin_is_not_found() {
        let result = PluginLoader::load_by_name("definitely-not-installed");
        assert!(matches!(result, Err(PluginError::NotFound(_))));
    }

    #[test]
    fn test_non_library_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-plugin.so");
        fs::write(&path, b"plain text").unwrap();

        assert!(matches!(PluginLoader::load_plugin(&path), Err(PluginError::Library { .. })));
    }
}
