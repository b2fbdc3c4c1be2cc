//! Connector descriptor reported to the pipeline runtime.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::models::config::{
    format_duration, DEFAULT_MAX_RETRIES, DEFAULT_POLLING_PERIOD, KEY_API_TOKEN, KEY_BASE_URL,
    KEY_BUFFER_SIZE, KEY_DOMAIN, KEY_MAX_RETRIES, KEY_POLLING_PERIOD, KEY_USER_NAME,
    MAX_BUFFER_SIZE,
};

/// One configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Value used when the key is absent. Empty when there is none.
    pub default: String,
    /// Whether the key must be present.
    pub required: bool,
    /// Human-readable description.
    pub description: String,
}

impl Parameter {
    fn required(description: &str) -> Self {
        Self {
            default: String::new(),
            required: true,
            description: description.to_string(),
        }
    }

    fn optional(default: impl Into<String>, description: &str) -> Self {
        Self {
            default: default.into(),
            required: false,
            description: description.to_string(),
        }
    }
}

/// Connector name, version and parameter tables.
#[derive(Debug, Clone, Serialize)]
pub struct Specification {
    /// Connector name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Connector version.
    pub version: String,
    /// Author.
    pub author: String,
    /// Parameters understood by the source.
    pub source_params: BTreeMap<String, Parameter>,
    /// Parameters understood by the destination.
    pub destination_params: BTreeMap<String, Parameter>,
}

fn connection_params() -> BTreeMap<String, Parameter> {
    BTreeMap::from([
        (
            KEY_DOMAIN.to_string(),
            Parameter::required("Zendesk subdomain the account is registered under"),
        ),
        (
            KEY_USER_NAME.to_string(),
            Parameter::required("User name (e-mail) the API token belongs to"),
        ),
        (
            KEY_API_TOKEN.to_string(),
            Parameter::required("Zendesk API token"),
        ),
        (
            KEY_BASE_URL.to_string(),
            Parameter::optional(
                "",
                "API base URL override, defaults to https://{domain}.zendesk.com",
            ),
        ),
    ])
}

/// Describe the connector and its parameters.
pub fn specification() -> Specification {
    let mut source_params = connection_params();
    source_params.insert(
        KEY_POLLING_PERIOD.to_string(),
        Parameter::optional(
            format_duration(DEFAULT_POLLING_PERIOD),
            "Fetch interval for consecutive iterations",
        ),
    );

    let mut destination_params = connection_params();
    destination_params.insert(
        KEY_BUFFER_SIZE.to_string(),
        Parameter::optional(
            MAX_BUFFER_SIZE.to_string(),
            "Tickets buffered per bulk import, at most 100",
        ),
    );
    destination_params.insert(
        KEY_MAX_RETRIES.to_string(),
        Parameter::optional(
            DEFAULT_MAX_RETRIES.to_string(),
            "Retries of a rate-limited bulk import before the write fails",
        ),
    );

    Specification {
        name: "zendesk".to_string(),
        summary: "Zendesk ticket source and destination connector".to_string(),
        version: format!("v{}", env!("CARGO_PKG_VERSION")),
        author: env!("CARGO_PKG_AUTHORS").to_string(),
        source_params,
        destination_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_parameters() {
        let spec = specification();
        assert_eq!(spec.name, "zendesk");
        for params in [&spec.source_params, &spec.destination_params] {
            for key in [KEY_DOMAIN, KEY_USER_NAME, KEY_API_TOKEN] {
                assert!(params[key].required, "{key} must be required");
            }
            assert!(!params[KEY_BASE_URL].required);
        }
    }

    #[test]
    fn test_defaults() {
        let spec = specification();
        assert_eq!(spec.source_params[KEY_POLLING_PERIOD].default, "2m");
        assert_eq!(spec.destination_params[KEY_BUFFER_SIZE].default, "100");
        assert_eq!(spec.destination_params[KEY_MAX_RETRIES].default, "3");
        assert!(!spec.source_params.contains_key(KEY_BUFFER_SIZE));
    }
}
