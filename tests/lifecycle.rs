/*
 *  tests/lifecycle.rs
 *
 *  Lifecycle driver end to end on the process shutdown state
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 */

use std::sync::Mutex;
use std::time::Duration;

use longship::engine::{EngineApplication, EngineSettings};
use longship::lifecycle::{Application, LifecycleDriver};
use longship::shutdown::{self, Reason};

// Every test here drives the global shutdown state.
static SERIAL: Mutex<()> = Mutex::new(());

struct RestartTwice {
    run: u32,
}

impl Application for RestartTwice {
    fn run(&mut self) {
        let reason = if self.run < 2 { Reason::InvoluntaryRestart } else { Reason::UserRequest };
        shutdown::request(reason, Some("scripted"));
    }
}

#[test]
fn test_restart_cycle_on_global_state() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut created = 0;

    let outcome = LifecycleDriver::global().run(|| {
        created += 1;
        // Every new instance starts from a clean state.
        assert!(!shutdown::is_requested());
        RestartTwice { run: created - 1 }
    });

    assert_eq!(outcome.runs, 3);
    assert_eq!(outcome.final_reason.reason, Reason::UserRequest);
    assert_eq!(outcome.final_reason.message, "scripted");
    assert!(!shutdown::is_requested());
}

#[cfg(feature = "headless")]
#[test]
fn test_engine_on_headless_platform() {
    use longship::platform::{BackendType, PlatformRequest, PlatformType};

    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let settings = EngineSettings {
        request: PlatformRequest::new(PlatformType::Headless, BackendType::NoPreference),
        frame_interval: Duration::from_millis(1),
        max_runtime: Some(Duration::from_millis(20)),
        ..EngineSettings::default()
    };

    let outcome = LifecycleDriver::global()
        .with_max_restarts(Some(0))
        .run(|| EngineApplication::new(settings.clone()));

    assert_eq!(outcome.runs, 1);
    assert_eq!(outcome.final_reason.reason, Reason::UserRequest);
    assert!(!shutdown::is_requested());
}

#[test]
fn test_no_platform_is_fatal() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let settings = EngineSettings {
        frame_interval: Duration::from_millis(1),
        max_runtime: Some(Duration::ZERO),
        ..EngineSettings::default()
    };

    let outcome = LifecycleDriver::global().run(|| {
        EngineApplication::with_state(settings.clone(), shutdown::global(), &[])
    });

    assert_eq!(outcome.runs, 1);
    assert_eq!(outcome.final_reason.reason, Reason::FatalError);
}
