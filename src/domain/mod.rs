//! Domain layer for the Zendesk connector
//!
//! Pure types and contracts: positions, change records, configuration and
//! the port traits adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ConfigError, ConnectorError, ConnectorResult};
