use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid store url: {0}. Must start with redis://, rediss:// or unix://")]
    InvalidStoreUrl(String),

    #[error("Store namespace cannot be empty")]
    EmptyNamespace,

    #[error("Invalid store pool_size: {0}. Must be at least 1")]
    InvalidPoolSize(usize),

    #[error("Invalid {tier} TTL: {secs}s. Must be at least 1 second")]
    InvalidTtl { tier: &'static str, secs: u64 },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .taskboard/config.yaml (project config, created by init)
    /// 3. .taskboard/local.yaml (project local overrides, optional)
    /// 4. Environment variables (TASKBOARD_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".taskboard/config.yaml"))
            .merge(Yaml::file(".taskboard/local.yaml"))
            .merge(Env::prefixed("TASKBOARD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TASKBOARD_").split("__"))
            .extract()
            .context(format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if let Some(url) = &config.store.url {
            let valid_schemes = ["redis://", "rediss://", "unix://"];
            if !valid_schemes.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(ConfigError::InvalidStoreUrl(url.clone()));
            }
        }
        if config.store.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if config.store.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize(config.store.pool_size));
        }
        if config.store.operation_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "store operation_timeout_ms must be positive".to_string(),
            ));
        }

        if config.cache.aggregate_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl { tier: "aggregate", secs: 0 });
        }
        if config.cache.activity_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl { tier: "activity", secs: 0 });
        }
        if config.cache.list_limit == 0 {
            return Err(ConfigError::ValidationFailed("cache list_limit must be at least 1".to_string()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
