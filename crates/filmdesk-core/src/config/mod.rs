use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const DATA_DIR: &str = ".filmdesk";
const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";

/// Root configuration for filmdesk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

impl Config {
    /// Path of the persisted session: the override when set, otherwise
    /// `session.json` next to the config file.
    pub fn session_path(&self) -> PathBuf {
        match self.session.path.as_deref() {
            Some(p) => expand_home(p),
            None => get_data_dir().join(SESSION_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    /// Base URL every resource path hangs off, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            user_agent: format!("filmdesk/{}", crate::VERSION),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub path: Option<String>,
}

/// Load configuration from the environment.
///
/// Priority:
/// 1. `FILMDESK_CONFIG` env var, full JSON config
/// 2. Individual env vars (merged on top of the file)
/// 3. File fallback (`~/.filmdesk/config.json`)
pub fn load_config_from_env(config_path: Option<&Path>) -> Config {
    if let Ok(json) = std::env::var("FILMDESK_CONFIG") {
        match serde_json::from_str::<Config>(&json) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!("Failed to parse FILMDESK_CONFIG: {}", e);
            }
        }
    }

    let mut cfg = load_config(config_path);

    if let Ok(v) = std::env::var("FILMDESK_API_BASE") {
        cfg.api.base_url = v;
    }
    if let Ok(v) = std::env::var("FILMDESK_TIMEOUT_SECS") {
        match v.parse() {
            Ok(secs) => cfg.api.timeout_secs = secs,
            Err(_) => tracing::warn!("Ignoring non-numeric FILMDESK_TIMEOUT_SECS: {}", v),
        }
    }
    if let Ok(v) = std::env::var("FILMDESK_SESSION_PATH") {
        cfg.session.path = Some(v);
    }

    cfg
}

/// `~/.filmdesk`, or `./.filmdesk` when there is no home directory.
pub fn get_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR)
}

/// `~/.filmdesk/config.json`.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join(CONFIG_FILE)
}

/// Resolve a user-supplied path, expanding a leading `~/`.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\"));
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

fn resolve(config_path: Option<&Path>) -> PathBuf {
    match config_path {
        Some(p) => p.to_str().map(expand_home).unwrap_or_else(|| p.to_path_buf()),
        None => get_config_path(),
    }
}

/// Read a config file. A missing file is `Ok(None)`.
pub fn read_config(path: &Path) -> std::result::Result<Option<Config>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

/// Load the config file, falling back to defaults when it is missing or
/// unusable.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = resolve(config_path);
    match read_config(&path) {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            tracing::warn!("{} ({}); using default configuration", e, path.display());
            Config::default()
        }
    }
}

/// Write the config as pretty JSON, creating `~/.filmdesk` if needed.
pub fn save_config(config: &Config, config_path: Option<&Path>) -> std::result::Result<(), ConfigError> {
    let path = resolve(config_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}
