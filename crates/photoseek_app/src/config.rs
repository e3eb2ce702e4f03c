use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use client_logging::{client_info, client_warn};
use photoseek_client::ApiSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILENAME: &str = ".photoseek.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub base_url: String,
    /// Bearer credential from the external auth provider; saved-photo
    /// commands need it, search does not.
    pub bearer_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            bearer_token: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            bearer_token: self.bearer_token.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization failed: {0}")]
    Serialize(String),
}

/// Load `.photoseek.ron` from `dir`. Missing file and parse failures both
/// fall back to defaults so a broken config never blocks startup.
pub fn load_config(dir: &Path) -> AppConfig {
    let path = dir.join(CONFIG_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            client_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            client_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}

/// Atomically write the config: temp file in the same directory, then rename.
pub fn save_config(dir: &Path, config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(config, pretty)
        .map_err(|err| ConfigError::Serialize(err.to_string()))?;

    let target = dir.join(CONFIG_FILENAME);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|err| ConfigError::Io(err.error))?;
    Ok(target)
}

/// Write a default config on first run so the user has a file to edit.
pub fn ensure_config_file(dir: &Path, config: &AppConfig) {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() {
        return;
    }
    match save_config(dir, config) {
        Ok(path) => client_info!("Wrote default config to {:?}", path),
        Err(err) => client_warn!("Failed to write default config: {}", err),
    }
}
