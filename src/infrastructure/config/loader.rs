use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;

use crate::domain::errors::ConfigError;
use crate::domain::models::config::{parse_duration, Config, MAX_BUFFER_SIZE};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "zendesk-connector.yaml";

/// Prefix of environment overrides, e.g. `ZENDESK_CONNECTOR_ZENDESK__DOMAIN`.
pub const ENV_PREFIX: &str = "ZENDESK_CONNECTOR_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. zendesk-connector.yaml in the working directory (optional)
    /// 3. Environment variables (ZENDESK_CONNECTOR_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`ConfigLoader::load`] with an explicit config file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, ignoring the environment
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if parse_duration(&config.source.polling_period).is_none_or(|d| d.is_zero()) {
            return Err(ConfigError::InvalidDuration {
                key: "source.polling_period".to_string(),
                value: config.source.polling_period.clone(),
            });
        }

        if config.destination.buffer_size == 0 {
            return Err(ConfigError::BufferSizeZero);
        }
        if config.destination.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::BufferSizeTooLarge(
                config.destination.buffer_size,
            ));
        }

        if let Some(url) = &config.zendesk.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "zendesk.base_url must be an http(s) URL, got {url:?}"
                )));
            }
        }

        Ok(())
    }
}
