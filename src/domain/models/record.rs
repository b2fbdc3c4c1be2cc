//! Change records exchanged with the pipeline runtime.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::Position;

/// Metadata key carrying the upstream ticket status.
pub const METADATA_TICKET_STATUS: &str = "zendesk.ticket.status";

/// Kind of change a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Ticket created in this change.
    #[default]
    Create,
    /// Existing ticket modified.
    Update,
}

impl Operation {
    /// Lowercase name used in logs and CLI output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// One ticket change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Ticket id rendered as a string.
    pub key: String,
    /// Raw ticket JSON. Opaque to the core.
    pub payload: Vec<u8>,
    /// When the ticket was created upstream.
    pub created_at: DateTime<Utc>,
    /// Resume point for this record.
    pub position: Position,
    /// Create or update.
    #[serde(default)]
    pub operation: Operation,
    /// Free-form string metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ChangeRecord {
    /// Create a record with the given key and payload.
    pub fn new(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            payload,
            created_at: DateTime::UNIX_EPOCH,
            position: Position::default(),
            operation: Operation::default(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set the resume position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the creation time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the operation kind.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Upstream ticket status, if the source recorded one.
    pub fn ticket_status(&self) -> Option<&str> {
        self.metadata.get(METADATA_TICKET_STATUS).map(String::as_str)
    }

    /// Payload interpreted as UTF-8 JSON text, lossily.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
