//! Authenticated HTTP client for the Zendesk REST API v2.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder};

use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::ConnectionConfig;

/// Per-request timeout of the shared HTTP client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the cursor-based incremental ticket export.
pub const INCREMENTAL_TICKETS_PATH: &str = "/api/v2/incremental/tickets/cursor.json";

/// Path of the bulk ticket import.
pub const CREATE_MANY_PATH: &str = "/api/v2/imports/tickets/create_many";

const USER_AGENT: &str = concat!("zendesk-connector/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one Zendesk account.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct ZendeskClient {
    /// The underlying HTTP client.
    http: Client,
    /// API root without trailing slash.
    base_url: String,
    /// Precomputed `Authorization` header value.
    authorization: String,
}

impl std::fmt::Debug for ZendeskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZendeskClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ZendeskClient {
    /// Build a client from validated connection settings.
    pub fn from_config(config: &ConnectionConfig) -> ConnectorResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_http_client(http, config))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http_client(http: Client, config: &ConnectionConfig) -> Self {
        Self {
            http,
            base_url: config.base_url(),
            authorization: basic_auth(&config.user_name, &config.api_token),
        }
    }

    /// API root, e.g. `https://acme.zendesk.com`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Build an authorized request.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, &self.authorization)
    }
}

/// `Authorization` header value for API-token authentication.
///
/// Zendesk expects `Basic base64("{user}/token:{api_token}")`.
pub fn basic_auth(user_name: &str, api_token: &str) -> String {
    let credentials = format!("{user_name}/token:{api_token}");
    format!("Basic {}", STANDARD.encode(credentials))
}

/// Read the `Retry-After` header as whole seconds.
pub fn retry_after(headers: &HeaderMap) -> ConnectorResult<Duration> {
    let raw = headers
        .get(RETRY_AFTER)
        .map(HeaderValue::to_str)
        .transpose()
        .map_err(|e| ConnectorError::RetryValueUnavailable(e.to_string()))?
        .ok_or_else(|| ConnectorError::RetryValueUnavailable("header missing".to_string()))?;

    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConnectorError::RetryValueUnavailable(format!("{raw:?}: {e}")))
}
