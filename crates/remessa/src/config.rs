//! Configuration management for remessa.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "remessa";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "remessa.db";

/// Minimum length of a usable remote API key. Anything shorter is treated
/// as a placeholder and leaves the application in local-only mode.
pub const MIN_API_KEY_LENGTH: usize = 20;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `REMESSA_`, sections separated
///    by `__`, e.g. `REMESSA_REMOTE__API_KEY`)
/// 2. TOML config file at `~/.config/remessa/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Remote backend configuration.
    pub remote: RemoteConfig,
    /// Login accounts.
    pub auth: AuthConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/remessa/remessa.db`
    pub database_path: Option<PathBuf>,
}

/// Remote backend configuration.
///
/// Both fields default to empty, which leaves the application in
/// local-only mode; records then live exclusively in the local store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// REST root of the hosted table backend, e.g.
    /// `https://project.example.co/rest/v1`.
    pub base_url: String,
    /// API key sent as the `apikey`/`Authorization: Bearer` header pair.
    pub api_key: String,
}

/// Login accounts configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted identifier/secret pairs. Not a security mechanism: this is
    /// a convenience gate for a single-operator tool.
    pub accounts: Vec<Account>,
}

/// A login account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Login identifier, matched case-insensitively.
    pub identifier: String,
    /// Login secret, matched exactly.
    pub secret: String,
    /// Display name shown after login.
    pub display_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            accounts: vec![
                Account {
                    identifier: "adm".to_string(),
                    secret: "adm".to_string(),
                    display_name: "ADMINISTRADOR".to_string(),
                },
                Account {
                    identifier: "cadastro".to_string(),
                    secret: "cadastro".to_string(),
                    display_name: "EQUIPE CADASTRO".to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("REMESSA_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        // A half-configured remote is almost certainly a mistake; refuse it
        // rather than silently running local-only.
        if self.remote.base_url.is_empty() != self.remote.api_key.is_empty() {
            return Err(Error::ConfigValidation {
                message: "remote.base_url and remote.api_key must be set together".to_string(),
            });
        }

        if !self.remote.base_url.is_empty() && !self.remote.base_url.starts_with("http") {
            return Err(Error::ConfigValidation {
                message: format!("remote.base_url is not an HTTP URL: {}", self.remote.base_url),
            });
        }

        for account in &self.auth.accounts {
            if account.identifier.is_empty() || account.secret.is_empty() {
                return Err(Error::ConfigValidation {
                    message: "auth accounts require a non-empty identifier and secret".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Whether a usable remote backend is configured.
    ///
    /// A static capability check (non-empty URL, sufficiently long key),
    /// not a live connectivity probe.
    #[must_use]
    pub fn remote_configured(&self) -> bool {
        !self.remote.base_url.is_empty() && self.remote.api_key.len() > MIN_API_KEY_LENGTH
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(config.remote.base_url.is_empty());
        assert!(config.remote.api_key.is_empty());
        assert_eq!(config.auth.accounts.len(), 2);
    }

    #[test]
    fn test_default_accounts() {
        let auth = AuthConfig::default();
        assert_eq!(auth.accounts[0].identifier, "adm");
        assert_eq!(auth.accounts[0].secret, "adm");
        assert_eq!(auth.accounts[1].identifier, "cadastro");
        assert_eq!(auth.accounts[1].display_name, "EQUIPE CADASTRO");
    }

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_remote_not_configured_by_default() {
        assert!(!Config::default().remote_configured());
    }

    #[test]
    fn test_remote_configured_requires_long_key() {
        let mut config = Config::default();
        config.remote.base_url = "https://project.example.co/rest/v1".to_string();
        config.remote.api_key = "short".to_string();
        assert!(!config.remote_configured());

        config.remote.api_key = "sb_publishable_0123456789abcdef".to_string();
        assert!(config.remote_configured());
    }

    #[test]
    fn test_validate_rejects_half_configured_remote() {
        let mut config = Config::default();
        config.remote.base_url = "https://project.example.co/rest/v1".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = Config::default();
        config.remote.base_url = "ftp://project.example.co".to_string();
        config.remote.api_key = "sb_publishable_0123456789abcdef".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_account_fields() {
        let mut config = Config::default();
        config.auth.accounts.push(Account {
            identifier: String::new(),
            secret: "x".to_string(),
            display_name: "X".to_string(),
        });

        let result = config.validate();
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();
        assert!(path.ends_with("remessa/remessa.db"));
    }

    #[test]
    fn test_database_path_override() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }
}
