//! Configuration schema, defaults, and layered loading for the asset
//! server binary.
//!
//! Precedence: defaults < config file < environment < CLI overrides.

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "uplift")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("uplift.toml"))
}

/// Client-cache tuning for served assets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheSettings {
    /// `Cache-Control: max-age` in seconds.
    pub max_age_secs: u32,
    /// Offset applied to the `Expires` header, in seconds.
    pub expires_secs: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_age_secs: 60 * 60 * 24 * 30,
            expires_secs: 15,
        }
    }
}

/// Fully resolved server configuration after all layers merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Directory assets are served from.
    pub root: PathBuf,
    pub cache: CacheSettings,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            root: PathBuf::from("."),
            cache: CacheSettings::default(),
        }
    }
}

impl ServeConfig {
    /// Rejects values that cannot produce a working server.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.host.is_empty(), "Invalid config: host must not be empty");
        ensure!(
            !self.root.as_os_str().is_empty(),
            "Invalid config: root must not be empty"
        );
        Ok(())
    }
}

/// Runtime overrides collected from the CLI.
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<ServeConfig> {
    let path = config_path();

    let config: ServeConfig = Figment::new()
        .merge(Serialized::defaults(ServeConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("UPLIFT_").split("_"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

/// Applies CLI overrides to a loaded config.
pub fn apply_overrides(mut config: ServeConfig, overrides: &ServeOverrides) -> ServeConfig {
    if let Some(host) = &overrides.host {
        config.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(root) = &overrides.root {
        config.root = root.clone();
    }
    config
}
