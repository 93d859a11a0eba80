//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The file is
//! optional; every setting has a default so the console runs without one.
//! Tokens never live in the config file, only in the credential store.

use gateway::ExpirySignal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "pms-console.toml";
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_CREDENTIALS_FILE: &str = ".pms-console/credentials.json";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub expiry: ExpiryConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Where the credential bundle is persisted
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
        }
    }
}

/// How the backend reports an expired access token
#[derive(Debug, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default = "default_expiry_messages")]
    pub messages: Vec<String>,
    #[serde(default = "default_expiry_codes")]
    pub codes: Vec<String>,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            messages: default_expiry_messages(),
            codes: default_expiry_codes(),
        }
    }
}

impl ExpiryConfig {
    pub fn signal(&self) -> ExpirySignal {
        ExpirySignal::new(self.messages.clone(), self.codes.clone())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_credentials_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(DEFAULT_CREDENTIALS_FILE)
}

fn default_expiry_messages() -> Vec<String> {
    vec!["jwt expired".to_string()]
}

fn default_expiry_codes() -> Vec<String> {
    vec!["TOKEN_EXPIRED".to_string()]
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Environment overrides:
    /// - `PMS_API_URL`: backend base URL
    /// - `PMS_TIMEOUT_SECS`: request timeout
    /// - `PMS_CREDENTIALS_PATH`: credential file location
    pub fn load(path: &Path) -> common::Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Config::default()
            }
            Err(e) => return Err(common::Error::io(path, e)),
        };

        if let Ok(url) = std::env::var("PMS_API_URL") {
            config.api.base_url = url;
        }
        if let Ok(secs) = std::env::var("PMS_TIMEOUT_SECS") {
            config.api.timeout_secs = secs.trim().parse().map_err(|_| {
                common::Error::Config(format!(
                    "PMS_TIMEOUT_SECS must be a whole number of seconds, got: {secs}"
                ))
            })?;
        }
        if let Ok(p) = std::env::var("PMS_CREDENTIALS_PATH") {
            config.session.credentials_path = PathBuf::from(p);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.expiry.messages.is_empty() && self.expiry.codes.is_empty() {
            return Err(common::Error::Config(
                "expiry needs at least one message or code".into(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_path {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}
