//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// CRM backend connection
    #[serde(default)]
    pub api: ApiSettings,

    /// TUI settings
    #[serde(default)]
    pub tui: TuiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory CSV exports are written to when no path is given
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the CRM backend (a path prefix such as `/crm` is kept)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as `X-API-Key` when set
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiSettings {
    /// Calls per page in the calls table
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Seconds between dashboard refreshes
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

// Default value functions

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    20
}

fn default_refresh_secs() -> u64 {
    30
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            export_dir: default_export_dir(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TuiSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::load_from(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse a specific config file without env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VOICECRM_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }

        if self.api.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("VOICECRM_API_KEY") {
                if !key.trim().is_empty() {
                    self.api.api_key = key;
                }
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "voicecrm", "voicecrm")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &Path) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where an export lands when the operator gives no path
    pub fn export_path(&self, file_name: &str) -> PathBuf {
        self.general.export_dir.join(file_name)
    }
}
