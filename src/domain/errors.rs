//! Domain errors for the Zendesk connector.

use thiserror::Error;

/// Render a non-success HTTP status with the optional response body.
fn format_unexpected_status(code: u16, body: &str) -> String {
    if body.is_empty() {
        format!("non 200 status code received({code})")
    } else {
        format!("non 200 status code received({code}): {body}")
    }
}

/// Errors raised while parsing connector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("\"{0}\" config value must be set")]
    MissingKey(String),

    #[error("invalid duration for \"{key}\": {value}")]
    InvalidDuration { key: String, value: String },

    #[error("invalid integer for \"{key}\": {value}")]
    InvalidInteger { key: String, value: String },

    #[error("buffer size {0} exceeds the maximum of {max}", max = crate::domain::models::config::MAX_BUFFER_SIZE)]
    BufferSizeTooLarge(usize),

    #[error("buffer size must be at least 1")]
    BufferSizeZero,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors surfaced by the connector's source and destination pipelines.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("retry-after value unavailable: {0}")]
    RetryValueUnavailable(String),

    #[error("{}", format_unexpected_status(*.code, .body))]
    UnexpectedStatus { code: u16, body: String },

    #[error("malformed ticket: {0}")]
    MalformedTicket(String),

    #[error("rate-limit exceeded, total retries: {retry_count}")]
    RateLimitExceeded { retry_count: u32 },

    #[error("iterator stopped")]
    IteratorStopped,

    #[error("background task panicked: {0}")]
    TaskPanicked(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("backoff retry")]
    BackoffRetry,

    #[error("connector has not been configured")]
    NotConfigured,

    #[error("connector has not been opened")]
    NotOpened,

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("acknowledgement failed: {0}")]
    AckFailed(String),
}

impl ConnectorError {
    /// Whether the caller should simply try again later.
    pub const fn is_backoff(&self) -> bool {
        matches!(self, Self::BackoffRetry)
    }

    /// Whether this error signals a cancelled or stopped pipeline rather
    /// than a fault.
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::Cancelled | Self::IteratorStopped)
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
