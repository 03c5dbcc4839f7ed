use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Persisted configuration, read-only to the login workflow. Every field is a
/// fallback for a CLI option that was not given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersistedConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub user_cert: Option<String>,
    pub user_root_ca_key: Option<String>,
    pub user_root_ca_password: Option<String>,
    pub proxy: Option<String>,
    pub encode_credentials: bool,
    pub debug: bool,
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bmcctl").join("config.json"))
}

/// Loads the config file from the platform config directory. A missing file
/// is not an error; it yields an all-defaults config.
pub async fn load() -> Result<PersistedConfig> {
    match default_path() {
        Some(path) if path.exists() => load_from(&path).await,
        _ => Ok(PersistedConfig::default()),
    }
}

pub async fn load_from(path: &Path) -> Result<PersistedConfig> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
