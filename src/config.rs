/*
 *  config.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Layered configuration: defaults, YAML file, command line
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

use clap::{Parser, ValueHint};
use dirs_next::home_dir;
use longship_sdk::LogLevel;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::logging::LoggerConfig;
use crate::platform::{BackendType, PlatformType};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration. Every field is optional so layers can merge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,  // trace | debug | info | warn | error | critical | off
    pub log_file: Option<PathBuf>,
    /// extra directory searched for render plugins
    pub plugin_dir: Option<PathBuf>,
    /// restarts allowed before the process exits anyway
    pub max_restarts: Option<u32>,
    /// stop the frame loop after this many seconds
    pub max_runtime_secs: Option<u64>,
    pub render: Option<RenderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenderConfig {
    pub platform: Option<PlatformType>,
    pub backend: Option<BackendType>,
    /// render plugin library tried before the built-in table
    pub plugin: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
    pub target_fps: Option<u32>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "longship", about = "longship engine host", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub plugin_dir: Option<PathBuf>,
    #[arg(long)]
    pub max_restarts: Option<u32>,
    #[arg(long)]
    pub max_runtime_secs: Option<u64>,
    #[arg(long, value_enum)]
    pub platform: Option<PlatformType>,
    #[arg(long, value_enum)]
    pub backend: Option<BackendType>,
    #[arg(long)]
    pub render_plugin: Option<String>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub target_fps: Option<u32>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer defaults, the YAML file and `cli`, then validate.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/longship/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/longship/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/longship.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["longship.yaml", "config/longship.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()        { dst.log_level = src.log_level; }
    if src.log_file.is_some()         { dst.log_file = src.log_file; }
    if src.plugin_dir.is_some()       { dst.plugin_dir = src.plugin_dir; }
    if src.max_restarts.is_some()     { dst.max_restarts = src.max_restarts; }
    if src.max_runtime_secs.is_some() { dst.max_runtime_secs = src.max_runtime_secs; }
    match (&mut dst.render, src.render) {
        (None, Some(r)) => dst.render = Some(r),
        (Some(d), Some(s)) => merge_render(d, s),
        _ => {}
    }
}

fn merge_render(dst: &mut RenderConfig, src: RenderConfig) {
    if src.platform.is_some()   { dst.platform = src.platform; }
    if src.backend.is_some()    { dst.backend = src.backend; }
    if src.plugin.is_some()     { dst.plugin = src.plugin; }
    if src.width.is_some()      { dst.width = src.width; }
    if src.height.is_some()     { dst.height = src.height; }
    if src.title.is_some()      { dst.title = src.title; }
    if src.target_fps.is_some() { dst.target_fps = src.target_fps; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()        { cfg.log_level = cli.log_level.clone(); }
    if cli.log_file.is_some()         { cfg.log_file = cli.log_file.clone(); }
    if cli.plugin_dir.is_some()       { cfg.plugin_dir = cli.plugin_dir.clone(); }
    if cli.max_restarts.is_some()     { cfg.max_restarts = cli.max_restarts; }
    if cli.max_runtime_secs.is_some() { cfg.max_runtime_secs = cli.max_runtime_secs; }

    let any_render = cli.platform.is_some()
        || cli.backend.is_some()
        || cli.render_plugin.is_some()
        || cli.width.is_some()
        || cli.height.is_some()
        || cli.title.is_some()
        || cli.target_fps.is_some();

    if any_render && cfg.render.is_none() {
        cfg.render = Some(RenderConfig::default());
    }
    if let Some(render) = cfg.render.as_mut() {
        if cli.platform.is_some()      { render.platform = cli.platform; }
        if cli.backend.is_some()       { render.backend = cli.backend; }
        if cli.render_plugin.is_some() { render.plugin = cli.render_plugin.clone(); }
        if cli.width.is_some()         { render.width = cli.width; }
        if cli.height.is_some()        { render.height = cli.height; }
        if cli.title.is_some()         { render.title = cli.title.clone(); }
        if cli.target_fps.is_some()    { render.target_fps = cli.target_fps; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::parse(level).is_none() {
            return Err(ConfigError::Validation(format!("unknown log_level '{level}'")));
        }
    }
    if let Some(render) = cfg.render.as_ref() {
        if render.width == Some(0) || render.height == Some(0) {
            return Err(ConfigError::Validation("render width/height must be > 0".into()));
        }
        if let Some(fps) = render.target_fps {
            if fps == 0 || fps > 1000 {
                return Err(ConfigError::Validation("render target_fps must be 1..=1000".into()));
            }
        }
        if render.platform == Some(PlatformType::Unsupported) {
            return Err(ConfigError::Validation("render platform 'unsupported' cannot be requested".into()));
        }
        if render.backend == Some(BackendType::Unsupported) {
            return Err(ConfigError::Validation("render backend 'unsupported' cannot be requested".into()));
        }
        if render.plugin.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Validation("render plugin name must not be empty".into()));
        }
    }
    Ok(())
}

impl Config {
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info)
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            level: self.log_level(),
            log_file: self.log_file.clone(),
        }
    }
}
