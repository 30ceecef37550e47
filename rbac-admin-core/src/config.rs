//! Configuration management

use crate::error::{ConsoleError, ConsoleResult, ErrorContext};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "RBAC_ADMIN_API_URL";

/// Top-level console configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub rights: RightsConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, including any `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_seconds: 30,
            user_agent: format!("rbac-admin/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Where durable client state lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory; a leading `~` expands to the home directory
    pub data_dir: String,
    /// File name of the credential triple inside `data_dir`
    pub credentials_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.rbac-admin".to_string(),
            credentials_file: "credentials.json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolved data directory
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir.strip_prefix('~') {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
                None => PathBuf::from(&self.data_dir),
            },
            None => PathBuf::from(&self.data_dir),
        }
    }

    /// Full path of the credentials file
    pub fn credentials_path(&self) -> PathBuf {
        self.data_path().join(&self.credentials_file)
    }
}

/// Rights editor behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsConfig {
    /// Re-fetch the menu catalog before a bulk save to detect changes made elsewhere
    pub verify_catalog_on_save: bool,
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self {
            verify_catalog_on_save: true,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConsoleResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConsoleError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ConsoleConfig = toml::from_str(&content).map_err(|e| ConsoleError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConsoleResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConsoleError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| ConsoleError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url must not be empty", "Set api.base_url"));
        }

        match url::Url::parse(&self.api.base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(invalid(
                    &format!("Unsupported URL scheme: {}", parsed.scheme()),
                    "Use an http:// or https:// base URL",
                ))
            }
            Err(e) => {
                return Err(invalid(
                    &format!("Invalid api.base_url: {}", e),
                    "Use an absolute URL such as http://localhost:5000/api",
                ))
            }
        }

        if self.api.timeout_seconds == 0 {
            return Err(invalid(
                "api.timeout_seconds must be greater than 0",
                "Set api.timeout_seconds to a positive value",
            ));
        }

        if self.storage.credentials_file.trim().is_empty() {
            return Err(invalid(
                "storage.credentials_file must not be empty",
                "Set storage.credentials_file to a file name",
            ));
        }

        Ok(())
    }
}

fn invalid(message: &str, suggestion: &str) -> ConsoleError {
    ConsoleError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion(suggestion),
    }
}
