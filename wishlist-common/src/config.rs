//! Bootstrap configuration and resolution helpers
//!
//! The TOML file only carries bootstrap concerns (data folder, port, logging,
//! AI service settings). A missing file is never fatal: the service logs a
//! warning and starts with built-in defaults.
//!
//! # Resolution priority
//!
//! Data folder:
//! 1. Command-line argument
//! 2. `WISHLIST_DATA_FOLDER` environment variable
//! 3. TOML `data_folder`
//! 4. OS-dependent default
//!
//! Gemini API key:
//! 1. `GEMINI_API_KEY` environment variable
//! 2. TOML `gemini.api_key`

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// File name of the bootstrap configuration
pub const CONFIG_FILE_NAME: &str = "wishlist.toml";

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "WISHLIST_DATA_FOLDER";

/// Environment variable carrying the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default cap on request bodies, in megabytes
pub const DEFAULT_UPLOAD_LIMIT_MB: usize = 32;

const APP_DIR_NAME: &str = "travel-wishlist";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the persisted wishlist (optional)
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// HTTP port for the local API
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Largest accepted request body, in megabytes (photos arrive base64-encoded)
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_folder: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            gemini: GeminiConfig::default(),
            enrichment: EnrichmentConfig::default(),
            upload_limit_mb: default_upload_limit_mb(),
        }
    }
}

impl TomlConfig {
    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mb.saturating_mul(1024 * 1024)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Settings for the Gemini generative-AI service
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API key (the environment variable takes precedence)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum spacing between two requests; 0 disables rate limiting
    #[serde(default)]
    pub min_request_interval_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            min_request_interval_ms: 0,
        }
    }
}

impl GeminiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Settings for the background detail enrichment
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Upper bound on a single detail fetch; 0 waits forever
    #[serde(default = "default_detail_timeout_secs")]
    pub detail_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            detail_timeout_secs: default_detail_timeout_secs(),
        }
    }
}

impl EnrichmentConfig {
    pub fn detail_timeout(&self) -> Option<Duration> {
        match self.detail_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_detail_timeout_secs() -> u64 {
    120
}

fn default_upload_limit_mb() -> usize {
    DEFAULT_UPLOAD_LIMIT_MB
}

/// Load bootstrap configuration from a TOML file
///
/// A missing file yields defaults with a warning. An unreadable or malformed
/// file is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Default location of the config file for the current user
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./travel_wishlist_data"))
}

/// Resolves the data folder from CLI → ENV → TOML → default
#[derive(Debug, Clone, Default)]
pub struct DataFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl DataFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_value: Option<PathBuf>) -> Self {
        Self {
            cli_arg,
            toml_value,
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(path = %path.display(), "Data folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(path = %path, "Data folder from {}", DATA_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            info!(path = %path.display(), "Data folder from TOML config");
            return path.clone();
        }

        let path = default_data_folder();
        info!(path = %path.display(), "Data folder from compiled default");
        path
    }
}

/// Create the data folder if it does not exist yet
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            Error::Config(format!(
                "Failed to create data folder {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(path = %path.display(), "Created data folder");
    }
    Ok(())
}

/// Resolve the Gemini API key from ENV → TOML
///
/// Returns `None` when no valid key is configured. That is not a startup
/// error: the wishlist stays browsable and adding a place reports the
/// missing credentials.
pub fn resolve_api_key(config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = config.gemini.api_key.clone().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Gemini API key found in environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Gemini API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Gemini API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "Gemini API key not configured. Set {} or gemini.api_key in {} to add new places.",
        API_KEY_ENV, CONFIG_FILE_NAME
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
