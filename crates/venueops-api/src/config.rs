use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use venueops_core::models::MaterializationConfig;

use crate::observability::LogFormat;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "venueops.toml";
/// Prefix of environment overrides; nested keys use `__` (`VENUEOPS_JWT__SECRET`).
pub const ENV_PREFIX: &str = "VENUEOPS_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("jwt.secret is required (set it in the config file or VENUEOPS_JWT__SECRET)")]
    MissingJwtSecret,

    #[error("recurrence.max_occurrences must be at least 1")]
    ZeroMaxOccurrences,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

/// Bearer token verification settings (HS256).
#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    #[serde(default = "default_leeway_seconds")]
    pub leeway_seconds: u64,
    #[serde(default = "default_true")]
    pub require_exp: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: None,
            audience: None,
            leeway_seconds: default_leeway_seconds(),
            require_exp: true,
        }
    }
}

impl JwtConfig {
    /// The signing secret, or an error when it is unset or blank.
    pub fn require_secret(&self) -> Result<&str, ConfigError> {
        match self.secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(ConfigError::MissingJwtSecret),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("require_exp", &self.require_exp)
            .finish()
    }
}

/// Recurrence expansion limits
#[derive(Deserialize, Debug, Clone)]
pub struct RecurrenceConfig {
    /// Upper bound on occurrences generated for one recurring task
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u16,
    /// Keep creating children after one fails to persist
    #[serde(default = "default_true")]
    pub continue_on_child_failure: bool,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            max_occurrences: default_max_occurrences(),
            continue_on_child_failure: true,
        }
    }
}

impl From<&RecurrenceConfig> for MaterializationConfig {
    fn from(config: &RecurrenceConfig) -> Self {
        MaterializationConfig {
            max_occurrences: config.max_occurrences,
            continue_on_child_failure: config.continue_on_child_failure,
        }
    }
}

fn default_database_url() -> String {
    "sqlite://venueops.db".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_leeway_seconds() -> u64 {
    60
}

fn default_max_occurrences() -> u16 {
    venueops_core::recurrence::DEFAULT_MAX_OCCURRENCES
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads the TOML file (if it exists) and then `VENUEOPS_` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        if config.recurrence.max_occurrences == 0 {
            return Err(ConfigError::ZeroMaxOccurrences);
        }
        Ok(config)
    }

    pub fn materialization(&self) -> MaterializationConfig {
        MaterializationConfig::from(&self.recurrence)
    }
}
