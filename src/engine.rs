/*
 *  engine.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Engine application: platform selection, window and frame loop
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

use std::thread;
use std::time::{Duration, Instant};

use longship_sdk::{critical, debug, error, info, warn};

use crate::config::Config;
use crate::lifecycle::Application;
use crate::logging::Core;
use crate::platform::selector::{available_configurations, select_platform, Candidate};
use crate::platform::{PlatformManager, PlatformRequest, WindowCreateInfo};
use crate::shutdown::{self, Reason, ShutdownState};

pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Engine settings resolved from the merged configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub request: PlatformRequest,
    /// Render plugin library tried before the built-in table
    pub render_plugin: Option<String>,
    pub window: WindowCreateInfo,
    pub frame_interval: Duration,
    pub max_runtime: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request: PlatformRequest::ANY,
            render_plugin: None,
            window: WindowCreateInfo::default(),
            frame_interval: frame_interval(DEFAULT_TARGET_FPS),
            max_runtime: None,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        let mut settings = EngineSettings {
            max_runtime: config.max_runtime_secs.map(Duration::from_secs),
            ..EngineSettings::default()
        };

        if let Some(render) = config.render.as_ref() {
            if let Some(platform) = render.platform {
                settings.request.platform = platform;
            }
            if let Some(backend) = render.backend {
                settings.request.backend = backend;
            }
            settings.render_plugin = render.plugin.clone();
            if let Some(width) = render.width {
                settings.window.width = width;
            }
            if let Some(height) = render.height {
                settings.window.height = height;
            }
            if let Some(title) = render.title.as_ref() {
                settings.window.title = title.clone();
            }
            if let Some(fps) = render.target_fps {
                settings.frame_interval = frame_interval(fps);
            }
        }

        settings
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}

/// One engine instance, created and destroyed by the lifecycle driver
pub struct EngineApplication<'a> {
    settings: EngineSettings,
    state: &'a ShutdownState,
    configurations: &'a [Candidate],
    platform: Option<Box<dyn PlatformManager>>,
    frames: u64,
}

impl EngineApplication<'static> {
    /// Engine bound to the process shutdown state and the build's platform table
    pub fn new(settings: EngineSettings) -> Self {
        EngineApplication::with_state(settings, shutdown::global(), available_configurations())
    }
}

impl<'a> EngineApplication<'a> {
    pub fn with_state(settings: EngineSettings, state: &'a ShutdownState, configurations: &'a [Candidate]) -> Self {
        Self {
            settings,
            state,
            configurations,
            platform: None,
            frames: 0,
        }
    }

    /// Frames presented by this instance
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn platform(&self) -> Option<&dyn PlatformManager> {
        self.platform.as_deref()
    }

    fn fatal(&self, message: &str) {
        critical!(Core, "{}", message);
        self.state.request(Reason::FatalError, Some(message));
    }

    #[cfg(feature = "plugin-system")]
    fn load_render_plugin(&self, name: &str) -> Option<Box<dyn PlatformManager>> {
        use crate::plugin::{PluginLoader, PluginPlatform};

        match PluginLoader::load_by_name(name).and_then(PluginPlatform::new) {
            Ok(platform) => Some(Box::new(platform)),
            Err(e) => {
                warn!(Core, "Render plugin '{}' unavailable ({}), using built-in platforms", name, e);
                None
            }
        }
    }

    #[cfg(not(feature = "plugin-system"))]
    fn load_render_plugin(&self, name: &str) -> Option<Box<dyn PlatformManager>> {
        warn!(Core, "Built without plugin-system, ignoring render plugin '{}'", name);
        None
    }

    fn create_platform(&self) -> Result<Box<dyn PlatformManager>, String> {
        if let Some(name) = self.settings.render_plugin.as_deref() {
            if let Some(platform) = self.load_render_plugin(name) {
                return Ok(platform);
            }
        }

        select_platform(self.configurations, self.settings.request).map_err(|e| format!("platform selection failed: {e}"))
    }

    fn frame_loop(&mut self, platform: &mut dyn PlatformManager) {
        let started = Instant::now();

        while !self.state.is_requested() {
            platform.poll_events();

            if let Err(e) = platform.present() {
                error!(Core, "Present failed: {}", e);
                self.state.request(Reason::InvoluntaryRestart, Some(&e.to_string()));
                break;
            }
            self.frames += 1;

            if let Some(limit) = self.settings.max_runtime {
                if started.elapsed() >= limit {
                    info!(Core, "Maximum runtime of {:?} reached", limit);
                    self.state.request(Reason::UserRequest, Some("maximum runtime reached"));
                    break;
                }
            }

            thread::sleep(self.settings.frame_interval);
        }

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            Core,
            "Frame loop stopped after {} frames in {:.2}s ({:.1} fps)",
            self.frames,
            elapsed,
            if elapsed > 0.0 { self.frames as f64 / elapsed } else { 0.0 }
        );
    }
}

impl Application for EngineApplication<'_> {
    fn run(&mut self) {
        let mut platform = match self.create_platform() {
            Ok(platform) => platform,
            Err(message) => {
                self.fatal(&message);
                return;
            }
        };

        info!(
            Core,
            "Running on {} ({} + {})",
            platform.name(),
            platform.platform_type(),
            platform.backend_type()
        );

        let window = match platform.create_window(&self.settings.window) {
            Ok(window) => window,
            Err(e) => {
                self.fatal(&format!("cannot create main window: {e}"));
                self.platform = Some(platform);
                return;
            }
        };

        match platform.attach_renderer(window) {
            Ok(true) => debug!(Core, "Renderer attached to main window"),
            Ok(false) => warn!(Core, "{} has no renderer, presenting nothing", platform.name()),
            Err(e) => {
                self.fatal(&format!("cannot attach renderer: {e}"));
                self.platform = Some(platform);
                return;
            }
        }

        self.frame_loop(platform.as_mut());

        // Torn down when the driver drops the application.
        self.platform = Some(platform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BackendType, PlatformError, PlatformType, WindowId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static PRESENTS: AtomicUsize = AtomicUsize::new(0);

    struct Counting;

    impl PlatformManager for Counting {
        fn platform_type(&self) -> PlatformType {
            PlatformType::Headless
        }
        fn backend_type(&self) -> BackendType {
            BackendType::Null
        }
        fn name(&self) -> &str {
            "counting"
        }
        fn create_window(&mut self, _info: &WindowCreateInfo) -> Result<WindowId, PlatformError> {
            Ok(WindowId(0))
        }
        fn attach_renderer(&mut self, _id: WindowId) -> Result<bool, PlatformError> {
            Ok(true)
        }
        fn poll_events(&mut self) {}
        fn present(&mut self) -> Result<(), PlatformError> {
            PRESENTS.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn counting() -> Option<Box<dyn PlatformManager>> {
        Some(Box::new(Counting))
    }

    fn table() -> Vec<Candidate> {
        vec![Candidate {
            platform: PlatformType::Headless,
            backend: BackendType::Null,
            create: Some(counting),
            score: 1,
        }]
    }

    fn quick() -> EngineSettings {
        EngineSettings {
            frame_interval: Duration::from_millis(1),
            max_runtime: Some(Duration::ZERO),
            ..EngineSettings::default()
        }
    }

    #[test]
    fn test_max_runtime_requests_user_shutdown() {
        let state = ShutdownState::new();
        let table = table();
        let mut app = EngineApplication::with_state(quick(), &state, &table);
        app.run();

        assert_eq!(app.frames(), 1);
        assert_eq!(app.platform().map(|p| p.name()), Some("counting"));
        assert_eq!(state.reason().reason, Reason::UserRequest);
        assert!(!state.restart_requested());
    }

    #[test]
    fn test_pending_request_skips_frames() {
        let state = ShutdownState::new();
        state.request(Reason::UserRestart, None);
        let table = table();
        let mut app = EngineApplication::with_state(quick(), &state, &table);
        app.run();

        assert_eq!(app.frames(), 0);
        assert!(state.restart_requested());
    }

    #[test]
    fn test_empty_table_is_fatal() {
        let state = ShutdownState::new();
        let mut app = EngineApplication::with_state(quick(), &state, &[]);
        app.run();

        let info = state.reason();
        assert_eq!(info.reason, Reason::FatalError);
        assert!(info.message.contains("platform selection failed"));
        assert!(app.platform().is_none());
    }

    #[test]
    fn test_settings_from_config() {
        let config: Config = serde_yaml::from_str(
            "max_runtime_secs: 2\n\
             render:\n  platform: headless\n  width: 64\n  height: 48\n  target_fps: 50\n",
        )
        .unwrap();
        let settings = EngineSettings::from(&config);

        assert_eq!(settings.request.platform, PlatformType::Headless);
        assert_eq!(settings.request.backend, BackendType::NoPreference);
        assert_eq!((settings.window.width, settings.window.height), (64, 48));
        assert_eq!(settings.frame_interval, Duration::from_millis(20));
        assert_eq!(settings.max_runtime, Some(Duration::from_secs(2)));
    }

    #[cfg(feature = "headless")]
    #[test]
    fn test_headless_frame_loop() {
        let _serial = crate::plugin::headless_test_lock();
        let state = ShutdownState::new();
        let settings = EngineSettings {
            request: PlatformRequest::new(PlatformType::Headless, BackendType::Null),
            ..quick()
        };
        let mut app = EngineApplication::with_state(settings, &state, available_configurations());
        app.run();

        assert_eq!(state.reason().reason, Reason::UserRequest);
        assert_eq!(app.platform().map(|p| p.backend_type()), Some(BackendType::Null));
    }
}
