//! Daemon configuration handling.
//!
//! Settings come from `daemon.toml` in the platform config directory, with
//! every field optional, and are then overridden by environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `POSTFORGE_SOCKET` | `socket_path` |
//! | `POSTFORGE_API_BASE_URL` | `api_base_url` |
//! | `POSTFORGE_API_VERSION` | `api_version` |

use anyhow::{Context, Result};
use directories::ProjectDirs;
use postforge_core::SecretBackend;
use postforge_core::client::{ApiConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SOCKET_ENV: &str = "POSTFORGE_SOCKET";
pub const API_BASE_URL_ENV: &str = "POSTFORGE_API_BASE_URL";
pub const API_VERSION_ENV: &str = "POSTFORGE_API_VERSION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Path to the Unix socket.
    pub socket_path: PathBuf,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Logging level, used when `RUST_LOG` is not set.
    pub log_level: String,

    /// LinkedIn API root.
    pub api_base_url: String,

    /// `LinkedIn-Version` header value.
    pub api_version: String,

    /// Per-request timeout for LinkedIn calls.
    pub request_timeout_secs: u64,

    /// Where account secrets are read from.
    pub secret_backend: SecretBackend,

    /// Prefix for `{prefix}_{ACCOUNT}_TOKEN` variables.
    pub env_prefix: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let socket_path = project_dirs()
            .as_ref()
            .and_then(|d| d.runtime_dir().map(|dir| dir.join("postforge.sock")))
            .unwrap_or_else(|| PathBuf::from("/tmp/postforge.sock"));

        Self {
            socket_path,
            config_path: PathBuf::new(),
            log_level: "info".to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            secret_backend: SecretBackend::default(),
            env_prefix: "POSTFORGE".to_string(),
        }
    }
}

impl DaemonConfig {
    /// Settings for the LinkedIn client.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            api_version: self.api_version.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(socket) = get(SOCKET_ENV) {
            self.socket_path = PathBuf::from(socket);
        }
        if let Some(base_url) = get(API_BASE_URL_ENV) {
            self.api_base_url = base_url;
        }
        if let Some(version) = get(API_VERSION_ENV) {
            self.api_version = version;
        }
    }
}

/// Default location of `daemon.toml`.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .as_ref()
        .map(|d| d.config_dir().join("daemon.toml"))
        .unwrap_or_else(|| PathBuf::from("postforge-daemon.toml"))
}

/// Load configuration from the default location, falling back to defaults,
/// then apply environment overrides.
pub fn load_config() -> Result<DaemonConfig> {
    let mut config = load_from_path(&default_config_path())?;
    config.apply_overrides(|name| std::env::var(name).ok());
    Ok(config)
}

/// Load configuration from a specific file. A missing file yields defaults.
pub fn load_from_path(config_path: &Path) -> Result<DaemonConfig> {
    let mut config = if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        DaemonConfig::default()
    };

    config.config_path = config_path.to_path_buf();
    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "raibid-labs", "postforge")
}
