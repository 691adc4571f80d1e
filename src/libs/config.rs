//! Configuration for the updater.
//!
//! Values are collected into a [`ConfigSource`] from up to three layers, each
//! overriding the previous one:
//!
//! 1. `configuration.txt` next to the executable, in dotenv format
//! 2. process environment variables with the same names
//! 3. remote secrets downloaded from Doppler when `DOPPLER_TOKEN` is present
//!
//! The merged source is then validated once into a [`Config`], which is
//! passed by reference to every component. Nothing downstream reads the
//! process environment.
//!
//! ## Keys
//!
//! | Key                          | Required | Meaning                                   |
//! |------------------------------|----------|-------------------------------------------|
//! | `TS_MERCHANT_KEY`            | yes      | Merchant identifier looked up in catalog  |
//! | `URL_API_TO_CHECK_VERSION`   | yes      | Version catalog endpoint                  |
//! | `JFROG_URL_ARTIFACT_FOLDER`  | yes      | Artifact folder in the artifact store     |
//! | `JFROG_TOKEN`                | yes      | Bearer token for the artifact store       |
//! | `AGENT_DOWNLOAD_DIRECTORY`   | yes      | Download directory, relative to install   |
//! | `VERSION_FILE`               | no       | Marker file name, `version.txt` default   |
//! | `HC_PING_URL`                | no       | Health-check ping base URL                |
//! | `HC_UUID_UPDATER`            | no       | Health check receiving update outcomes    |
//! | `HC_API_BASE_URL`            | no       | Health-check management API               |
//! | `HC_API_KEY`                 | no       | Management API key                        |
//! | `HC_UUID_CRON`               | no       | Health check paused/resumed by `monitor`  |
//! | `HC_PING_URL_CRON`           | no       | Heartbeat URL of the cron check           |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agent_updater::libs::config::Config;
//! use agent_updater::libs::data_storage::DataStorage;
//! use agent_updater::libs::http::Http;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let storage = DataStorage::new();
//! let config = Config::load(&storage, None, &Http::client()?).await?;
//! println!("Merchant: {}", config.merchant_key);
//! # Ok(())
//! # }
//! ```

use super::data_storage::DataStorage;
use super::version_store::VERSION_FILE_NAME;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration file name expected in the install directory.
pub const CONFIG_FILE_NAME: &str = "configuration.txt";

/// Doppler endpoint returning every secret of the token's config as JSON.
pub const DOPPLER_API_URL: &str = "https://api.doppler.com/v3/configs/config/secrets/download";

pub const DOPPLER_TOKEN: &str = "DOPPLER_TOKEN";
pub const TS_MERCHANT_KEY: &str = "TS_MERCHANT_KEY";
pub const URL_API_TO_CHECK_VERSION: &str = "URL_API_TO_CHECK_VERSION";
pub const JFROG_URL_ARTIFACT_FOLDER: &str = "JFROG_URL_ARTIFACT_FOLDER";
pub const JFROG_TOKEN: &str = "JFROG_TOKEN";
pub const AGENT_DOWNLOAD_DIRECTORY: &str = "AGENT_DOWNLOAD_DIRECTORY";
pub const VERSION_FILE: &str = "VERSION_FILE";
pub const HC_PING_URL: &str = "HC_PING_URL";
pub const HC_UUID_UPDATER: &str = "HC_UUID_UPDATER";
pub const HC_API_BASE_URL: &str = "HC_API_BASE_URL";
pub const HC_API_KEY: &str = "HC_API_KEY";
pub const HC_UUID_CRON: &str = "HC_UUID_CRON";
pub const HC_PING_URL_CRON: &str = "HC_PING_URL_CRON";

/// Every key the updater understands. Environment variables outside this
/// list are never copied into a [`ConfigSource`].
pub const KNOWN_KEYS: &[&str] = &[
    DOPPLER_TOKEN,
    TS_MERCHANT_KEY,
    URL_API_TO_CHECK_VERSION,
    JFROG_URL_ARTIFACT_FOLDER,
    JFROG_TOKEN,
    AGENT_DOWNLOAD_DIRECTORY,
    VERSION_FILE,
    HC_PING_URL,
    HC_UUID_UPDATER,
    HC_API_BASE_URL,
    HC_API_KEY,
    HC_UUID_CRON,
    HC_PING_URL_CRON,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} doesn't exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to parse configuration file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    #[error("{0} is not set in the configuration")]
    Missing(&'static str),

    #[error("{key} must be an http(s) URL, got '{value}'")]
    InvalidUrl { key: &'static str, value: String },

    #[error("failed to load remote secrets: {0}")]
    Secrets(#[source] reqwest::Error),
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Where update outcomes are pinged.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheckConfig {
    pub ping_url: Url,
    pub updater_uuid: String,
}

/// Management API used to pause and resume the cron health check.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub api_base_url: Url,
    pub api_key: Secret,
    pub cron_uuid: String,
}

/// Resolved configuration of one updater process.
#[derive(Debug, Clone)]
pub struct Config {
    pub merchant_key: String,
    pub catalog_url: Url,
    pub artifact_folder_url: Url,
    pub artifact_token: Secret,
    pub download_dir: PathBuf,
    pub version_file: PathBuf,
    pub lock_file: PathBuf,
    pub health_check: Option<HealthCheckConfig>,
    pub monitor: Option<MonitorConfig>,
    pub cron_heartbeat_url: Option<Url>,
}

/// Raw key/value pairs collected before validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    vars: HashMap<String, String>,
}

impl ConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a dotenv file without touching the process environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let to_error = |source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        };

        let mut source = Self::new();
        for item in dotenv::from_path_iter(path).map_err(to_error)? {
            let (key, value) = item.map_err(to_error)?;
            source.set(key, value);
        }
        Ok(source)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Overrides known keys with the given environment-like pairs.
    pub fn merge_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if KNOWN_KEYS.contains(&key.as_str()) {
                self.set(key, value);
            }
        }
    }

    /// Overrides values with the secrets stored in Doppler when a
    /// `DOPPLER_TOKEN` is configured. Does nothing otherwise.
    pub async fn merge_remote_secrets(&mut self, client: &Client, api_url: &str) -> Result<(), ConfigError> {
        let Some(token) = self.get(DOPPLER_TOKEN).map(str::to_owned) else {
            return Ok(());
        };

        let secrets = client
            .get(api_url)
            .query(&[("format", "json")])
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(ConfigError::Secrets)?
            .json::<HashMap<String, serde_json::Value>>()
            .await
            .map_err(ConfigError::Secrets)?;

        debug!(count = secrets.len(), "remote secrets loaded");
        for (key, value) in secrets {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            self.set(key, value);
        }
        Ok(())
    }

    fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn require_url(&self, key: &'static str) -> Result<Url, ConfigError> {
        parse_url(key, self.require(key)?)
    }

    fn optional_url(&self, key: &'static str) -> Result<Option<Url>, ConfigError> {
        self.get(key).map(|value| parse_url(key, value)).transpose()
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
    };
    let url = Url::parse(value).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

impl Config {
    /// Loads and validates the configuration for the installation in
    /// `storage`.
    ///
    /// When `config_path` is `None`, `configuration.txt` in the install
    /// directory is used if present; an explicit path must exist.
    pub async fn load(storage: &DataStorage, config_path: Option<&Path>, client: &Client) -> Result<Self, ConfigError> {
        let mut source = match config_path {
            Some(path) => ConfigSource::from_file(path)?,
            None => {
                let default_path = storage.base_path().join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    ConfigSource::from_file(&default_path)?
                } else {
                    debug!(path = %default_path.display(), "no configuration file, using environment only");
                    ConfigSource::new()
                }
            }
        };
        source.merge_env(std::env::vars());
        source.merge_remote_secrets(client, DOPPLER_API_URL).await?;

        Self::from_source(&source, storage)
    }

    /// Validates `source` and resolves paths against the install directory.
    pub fn from_source(source: &ConfigSource, storage: &DataStorage) -> Result<Self, ConfigError> {
        let base = storage.base_path();

        let health_check = match (source.optional_url(HC_PING_URL)?, source.get(HC_UUID_UPDATER)) {
            (Some(ping_url), Some(uuid)) => Some(HealthCheckConfig {
                ping_url,
                updater_uuid: uuid.to_string(),
            }),
            _ => None,
        };

        let monitor = match (source.optional_url(HC_API_BASE_URL)?, source.get(HC_API_KEY), source.get(HC_UUID_CRON)) {
            (Some(api_base_url), Some(api_key), Some(uuid)) => Some(MonitorConfig {
                api_base_url,
                api_key: Secret::new(api_key),
                cron_uuid: uuid.to_string(),
            }),
            _ => None,
        };

        Ok(Config {
            merchant_key: source.require(TS_MERCHANT_KEY)?.to_string(),
            catalog_url: source.require_url(URL_API_TO_CHECK_VERSION)?,
            artifact_folder_url: source.require_url(JFROG_URL_ARTIFACT_FOLDER)?,
            artifact_token: Secret::new(source.require(JFROG_TOKEN)?),
            download_dir: base.join(source.require(AGENT_DOWNLOAD_DIRECTORY)?),
            version_file: base.join(source.get(VERSION_FILE).unwrap_or(VERSION_FILE_NAME)),
            lock_file: base.join(format!(".{}.lock", super::data_storage::APP_NAME)),
            health_check,
            monitor,
            cron_heartbeat_url: source.optional_url(HC_PING_URL_CRON)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let secret = Secret::new("cmVmdGtuOjAx");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
        assert_eq!(secret.expose(), "cmVmdGtuOjAx");
    }

    #[test]
    fn test_parse_url_rejects_non_http_schemes() {
        assert!(parse_url(HC_PING_URL, "https://hc-ping.com").is_ok());
        assert!(matches!(
            parse_url(HC_PING_URL, "ftp://hc-ping.com"),
            Err(ConfigError::InvalidUrl { key: HC_PING_URL, .. })
        ));
        assert!(parse_url(HC_PING_URL, "not a url").is_err());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut source = ConfigSource::new();
        source.set(TS_MERCHANT_KEY, "   ");
        assert_eq!(source.get(TS_MERCHANT_KEY), None);
    }
}
