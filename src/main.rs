/*
 *  main.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Entry point: configure, install handlers, drive the engine
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

use std::process::ExitCode;

use anyhow::Context;
use longship::config;
use longship::engine::{EngineApplication, EngineSettings};
use longship::lifecycle::LifecycleDriver;
use longship::logging::{self, EntryPoint};
use longship::shutdown::{signals, Reason};
use longship_sdk::{critical, info};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> anyhow::Result<ExitCode> {
    let cfg = config::load().context("loading configuration")?;

    logging::init(&cfg.logger_config()).context("initializing logging")?;
    info!(EntryPoint, "longship v{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    if let Err(e) = signals::register_interrupt_handlers() {
        critical!(EntryPoint, "Cannot install interrupt handlers: {}", e);
        return Err(e).context("registering interrupt handlers");
    }

    #[cfg(feature = "plugin-system")]
    if let Some(dir) = cfg.plugin_dir.clone() {
        longship::plugin::PluginLoader::set_plugin_dir(dir);
    }

    let settings = EngineSettings::from(&cfg);
    let outcome = LifecycleDriver::global()
        .with_max_restarts(cfg.max_restarts)
        .run(|| EngineApplication::new(settings.clone()));

    info!(
        EntryPoint,
        "Engine exited after {} run(s): {} ({})",
        outcome.runs,
        outcome.final_reason.reason,
        outcome.final_reason.message
    );

    Ok(match outcome.final_reason.reason {
        Reason::FatalError | Reason::SignalUnhandled => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
