//! Configuration management for taskdeck.
//!
//! Loads configuration from ${TASKDECK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for taskdeck configuration and data directories.
    //!
    //! TASKDECK_HOME resolution order:
    //! 1. TASKDECK_HOME environment variable (if set)
    //! 2. ~/.config/taskdeck (default)

    use std::path::PathBuf;

    /// Returns the taskdeck home directory.
    ///
    /// Checks TASKDECK_HOME env var first, falls back to ~/.config/taskdeck
    pub fn taskdeck_home() -> PathBuf {
        if let Ok(home) = std::env::var("TASKDECK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("taskdeck"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        taskdeck_home().join("config.toml")
    }

    /// Returns the path to the credentials file.
    pub fn credentials_path() -> PathBuf {
        taskdeck_home().join("credentials.json")
    }
}

/// Default config file contents written by `taskdeck config init`.
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# taskdeck configuration

# Base URL of the authentication service.
auth_url = "http://127.0.0.1:8000/api/auth"

# Base URL of the task service.
tasks_url = "http://127.0.0.1:8000/api/tasks"

# Request timeout in seconds (0 disables).
# request_timeout_secs = 0
"#;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the authentication service
    pub auth_url: String,

    /// Base URL of the task service
    pub tasks_url: String,

    /// Timeout for API requests in seconds (0 disables)
    pub request_timeout_secs: u32,
}

impl Config {
    const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:8000/api/auth";
    const DEFAULT_TASKS_URL: &str = "http://127.0.0.1:8000/api/tasks";
    /// Default is disabled
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 0;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, DEFAULT_CONFIG_TEMPLATE)
    }

    /// Returns the effective auth service base URL, honoring the
    /// TASKDECK_AUTH_URL environment override. Trailing slashes are trimmed
    /// so endpoint paths can be appended directly.
    pub fn effective_auth_url(&self) -> String {
        let url = std::env::var("TASKDECK_AUTH_URL").unwrap_or_else(|_| self.auth_url.clone());
        url.trim_end_matches('/').to_string()
    }

    /// Returns the effective task service base URL, honoring the
    /// TASKDECK_TASKS_URL environment override.
    pub fn effective_tasks_url(&self) -> String {
        let url = std::env::var("TASKDECK_TASKS_URL").unwrap_or_else(|_| self.tasks_url.clone());
        url.trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: Self::DEFAULT_AUTH_URL.to_string(),
            tasks_url: Self::DEFAULT_TASKS_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
