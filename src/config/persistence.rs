//! Config file location, load, save, and validation.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::types::ServerConfig;

/// Default config location: `config.json` next to the executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join("config.json"))
}

pub fn resolve_config_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

/// Runs before logging is initialised, so it reports only through its result.
/// A missing file yields the built-in defaults.
pub async fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    let config_path = resolve_config_path(path)?;

    if config_path.exists() {
        let content = tokio::fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config: {:?}", config_path))?;
        let config: ServerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", config_path))?;

        validate(&config).with_context(|| format!("Invalid configuration in {:?}", config_path))?;
        Ok(config)
    } else {
        Ok(ServerConfig::default())
    }
}

pub async fn save_config(config: &ServerConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}

/// Reject settings that would make the lifecycle controllers misbehave.
pub fn validate(config: &ServerConfig) -> Result<()> {
    if config.timing.max_attempts == 0 {
        return Err(anyhow!("timing.max_attempts must be at least 1"));
    }
    if config.timing.poll_interval_secs == 0 {
        return Err(anyhow!("timing.poll_interval_secs must be at least 1"));
    }
    if config.server.session_name.trim().is_empty() {
        return Err(anyhow!("server.session_name must not be empty"));
    }
    if config.service.unit.trim().is_empty() {
        return Err(anyhow!("service.unit must not be empty"));
    }
    Ok(())
}
