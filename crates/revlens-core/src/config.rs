//! Configuration management for Revlens.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/revlens/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Image provider cascade settings
    pub providers: ProviderConfig,
    /// Reverse-image engine settings
    pub engines: EngineConfig,
    /// Candidate validation settings
    pub validation: ValidationConfig,
    /// Job store settings
    pub jobs: JobConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `REVLENS_HEADLESS`: Override browser headless mode (true/false)
    /// - `REVLENS_NAV_TIMEOUT_SECS`: Override navigation timeout
    /// - `REVLENS_JOB_RETENTION_SECS`: Override job store retention
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("REVLENS_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("REVLENS_NAV_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.browser.navigation_timeout_secs = secs;
                tracing::debug!("Override navigation_timeout_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("REVLENS_JOB_RETENTION_SECS") {
            if let Ok(secs) = val.parse() {
                config.jobs.retention_secs = secs;
                tracing::debug!("Override jobs.retention_secs from env: {}", secs);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/revlens/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("io", "revlens", "revlens").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
        }
    }
}

/// Image provider cascade settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Per-provider timeout in seconds
    pub timeout_secs: u64,
    /// Maximum results a provider is asked for
    pub result_cap: usize,
    /// Lower bound of the jittered pre-request delay, in milliseconds
    pub jitter_min_ms: u64,
    /// Upper bound of the jittered pre-request delay, in milliseconds
    pub jitter_max_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            result_cap: 5,
            jitter_min_ms: 500,
            jitter_max_ms: 1500,
        }
    }
}

/// Reverse-image engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-engine navigation timeout in seconds
    pub timeout_secs: u64,
    /// Candidates kept per engine
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            top_k: 5,
        }
    }
}

/// Candidate validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Navigation timeout per candidate, in seconds
    pub timeout_secs: u64,
    /// How much visible body text is kept as a snippet
    pub snippet_len: usize,
    /// Title phrases that mark a page as a dead profile
    pub title_denylist: Vec<String>,
    /// Body phrases that mark a page as a dead profile
    pub body_denylist: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            snippet_len: 1000,
            title_denylist: vec![
                "page not found".to_string(),
                "404".to_string(),
                "not found".to_string(),
                "doesn't exist".to_string(),
                "does not exist".to_string(),
                "user not found".to_string(),
            ],
            body_denylist: vec![
                "this page isn't available".to_string(),
                "sorry, this content isn't available right now".to_string(),
            ],
        }
    }
}

/// Job store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// How many images a job sources for its query
    pub image_limit: usize,
    /// How long finished jobs stay readable before eviction, in seconds
    pub retention_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            image_limit: 3,
            retention_secs: 3600,
        }
    }
}
