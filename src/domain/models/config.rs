//! Connector configuration.
//!
//! Two surfaces share these types: the flat string map handed over by the
//! pipeline runtime (`SourceConfig::parse`, `DestinationConfig::parse`) and
//! the hierarchical file/env configuration of the standalone binary
//! (`Config`), which renders back into the same flat map.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;

/// Zendesk account subdomain.
pub const KEY_DOMAIN: &str = "zendesk.domain";
/// Account user name (e-mail).
pub const KEY_USER_NAME: &str = "zendesk.userName";
/// API token paired with the user name.
pub const KEY_API_TOKEN: &str = "zendesk.apiToken";
/// Optional API base URL override.
pub const KEY_BASE_URL: &str = "zendesk.baseUrl";
/// Source polling interval.
pub const KEY_POLLING_PERIOD: &str = "pollingPeriod";
/// Destination batch size.
pub const KEY_BUFFER_SIZE: &str = "bufferSize";
/// Destination retry bound for rate-limited writes.
pub const KEY_MAX_RETRIES: &str = "maxRetries";

/// Default source polling interval.
pub const DEFAULT_POLLING_PERIOD: Duration = Duration::from_secs(120);
/// Upper bound of tickets per bulk import request.
pub const MAX_BUFFER_SIZE: usize = 100;
/// Default number of rate-limit retries per batch.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Credentials and endpoint shared by source and destination.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionConfig {
    /// Account subdomain, e.g. `acme` for `acme.zendesk.com`.
    #[serde(default)]
    pub domain: String,

    /// User name the API token belongs to.
    #[serde(default)]
    pub user_name: String,

    /// API token.
    #[serde(default)]
    pub api_token: String,

    /// Base URL override. Defaults to `https://{domain}.zendesk.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("domain", &self.domain)
            .field("user_name", &self.user_name)
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ConnectionConfig {
    /// Read the connection keys from a runtime config map.
    pub fn parse(cfg: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let conn = Self {
            domain: required(cfg, KEY_DOMAIN)?,
            user_name: required(cfg, KEY_USER_NAME)?,
            api_token: required(cfg, KEY_API_TOKEN)?,
            base_url: optional(cfg, KEY_BASE_URL).map(|url| url.trim_end_matches('/').to_string()),
        };
        Ok(conn)
    }

    /// Reject empty credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            (KEY_DOMAIN, &self.domain),
            (KEY_USER_NAME, &self.user_name),
            (KEY_API_TOKEN, &self.api_token),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// API root all endpoint paths are appended to.
    pub fn base_url(&self) -> String {
        self.base_url.as_ref().map_or_else(
            || format!("https://{}.zendesk.com", self.domain),
            |url| url.trim_end_matches('/').to_string(),
        )
    }

    fn write_to(&self, map: &mut HashMap<String, String>) {
        map.insert(KEY_DOMAIN.to_string(), self.domain.clone());
        map.insert(KEY_USER_NAME.to_string(), self.user_name.clone());
        map.insert(KEY_API_TOKEN.to_string(), self.api_token.clone());
        if let Some(url) = &self.base_url {
            map.insert(KEY_BASE_URL.to_string(), url.clone());
        }
    }
}

/// Parsed source configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Credentials and endpoint.
    pub connection: ConnectionConfig,
    /// Interval between incremental export fetches.
    pub polling_period: Duration,
}

impl SourceConfig {
    /// Parse and validate the runtime config map for the source.
    pub fn parse(cfg: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let connection = ConnectionConfig::parse(cfg)?;
        let polling_period = match optional(cfg, KEY_POLLING_PERIOD) {
            None => DEFAULT_POLLING_PERIOD,
            Some(raw) => parse_duration(raw)
                .filter(|d| !d.is_zero())
                .ok_or_else(|| ConfigError::InvalidDuration {
                    key: KEY_POLLING_PERIOD.to_string(),
                    value: raw.to_string(),
                })?,
        };
        Ok(Self {
            connection,
            polling_period,
        })
    }
}

/// Parsed destination configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    /// Credentials and endpoint.
    pub connection: ConnectionConfig,
    /// Records buffered before a bulk import is issued.
    pub buffer_size: usize,
    /// Rate-limit retries allowed per batch.
    pub max_retries: u32,
}

impl DestinationConfig {
    /// Parse and validate the runtime config map for the destination.
    pub fn parse(cfg: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let connection = ConnectionConfig::parse(cfg)?;

        let buffer_size = match optional(cfg, KEY_BUFFER_SIZE) {
            None => MAX_BUFFER_SIZE,
            Some(raw) => parse_integer::<usize>(KEY_BUFFER_SIZE, raw)?,
        };
        if buffer_size == 0 {
            return Err(ConfigError::BufferSizeZero);
        }
        if buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::BufferSizeTooLarge(buffer_size));
        }

        let max_retries = match optional(cfg, KEY_MAX_RETRIES) {
            None => DEFAULT_MAX_RETRIES,
            Some(raw) => parse_integer::<u32>(KEY_MAX_RETRIES, raw)?,
        };

        Ok(Self {
            connection,
            buffer_size,
            max_retries,
        })
    }
}

fn required(cfg: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    optional(cfg, key)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn optional<'a>(cfg: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    cfg.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_integer<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidInteger {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Parse a duration such as `500ms`, `6s`, `2m`, `1h` or `1h30m`.
///
/// A bare `0` is accepted. Fractional amounts (`1.5m`) are allowed.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let number = &rest[..num_len];
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_millis: u64 = match &rest[..unit_len] {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            _ => return None,
        };
        rest = &rest[unit_len..];

        let part = if number.contains('.') {
            let amount: f64 = number.parse().ok()?;
            #[allow(clippy::cast_precision_loss)]
            let millis = amount * unit_millis as f64;
            Duration::try_from_secs_f64(millis / 1_000.0).ok()?
        } else {
            let amount: u64 = number.parse().ok()?;
            Duration::from_millis(amount.checked_mul(unit_millis)?)
        };
        total = total.checked_add(part)?;
    }
    Some(total)
}

/// Render a duration in the same notation [`parse_duration`] accepts.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis == 0 {
        "0".to_string()
    } else if millis % 3_600_000 == 0 {
        format!("{}h", millis / 3_600_000)
    } else if millis % 60_000 == 0 {
        format!("{}m", millis / 60_000)
    } else if millis % 1_000 == 0 {
        format!("{}s", millis / 1_000)
    } else {
        format!("{millis}ms")
    }
}

/// Root configuration of the standalone binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Zendesk account connection.
    #[serde(default)]
    pub zendesk: ConnectionConfig,

    /// Source settings.
    #[serde(default)]
    pub source: SourceSettings,

    /// Destination settings.
    #[serde(default)]
    pub destination: DestinationSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Flat runtime map for the source.
    pub fn source_settings_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        self.zendesk.write_to(&mut map);
        map.insert(
            KEY_POLLING_PERIOD.to_string(),
            self.source.polling_period.clone(),
        );
        map
    }

    /// Flat runtime map for the destination.
    pub fn destination_settings_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        self.zendesk.write_to(&mut map);
        map.insert(
            KEY_BUFFER_SIZE.to_string(),
            self.destination.buffer_size.to_string(),
        );
        map.insert(
            KEY_MAX_RETRIES.to_string(),
            self.destination.max_retries.to_string(),
        );
        map
    }
}

/// Source section of the root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceSettings {
    /// Polling interval, e.g. `2m`.
    #[serde(default = "default_polling_period")]
    pub polling_period: String,
}

fn default_polling_period() -> String {
    format_duration(DEFAULT_POLLING_PERIOD)
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            polling_period: default_polling_period(),
        }
    }
}

/// Destination section of the root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DestinationSettings {
    /// Records per bulk import (1-100).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Rate-limit retries per batch.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_buffer_size() -> usize {
    MAX_BUFFER_SIZE
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for DestinationSettings {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_retries: default_max_retries(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling log files. Logs go to stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
        }
    }
}
