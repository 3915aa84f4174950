//! Layered server configuration.
//!
//! # Responsibility
//! - Merge built-in defaults, an optional TOML file and `SUPERLISTS_` env vars.
//! - Apply command-line flags on top of the merged result.
//!
//! # Invariants
//! - Later sources win: defaults < file < environment < flags.
//! - Nested keys use `__` in environment variable names
//!   (`SUPERLISTS_SERVER__PORT`).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// File picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "superlists.toml";
pub const ENV_PREFIX: &str = "SUPERLISTS_";

/// HTTP listener and public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Public origin used in login links. Derived from address and port when unset.
    pub base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            base_url: None,
        }
    }
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.address, self.port),
        }
    }
}

/// SQLite database location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("superlists.sqlite3"),
        }
    }
}

/// Log level and optional absolute log directory (stderr when unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: superlists_core::default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Where login emails are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Print each message to stdout.
    #[default]
    Console,
    /// Append each message to `mail.file`.
    File,
}

/// Login email delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransport,
    /// Required when `transport = "file"`.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub mail: MailConfig,
}

/// Command-line values that take precedence over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Loads configuration from all sources.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn load(
        config_path: Option<&Path>,
        overrides: &CliOverrides,
    ) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(config_path)?.extract()?;
        config.apply(overrides);
        Ok(config)
    }

    fn figment(config_path: Option<&Path>) -> Result<Figment, figment::Error> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(figment::Error::from(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn apply(&mut self, overrides: &CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(path) = &overrides.database {
            self.database.path = path.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }
}
