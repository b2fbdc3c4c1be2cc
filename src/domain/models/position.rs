//! Resumable source position.
//!
//! The host runtime stores positions as opaque bytes; internally they are
//! JSON objects of the form `{"LastModified": "<RFC3339>", "ID": <number>}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{ConnectorError, ConnectorResult};

/// Resume point for the incremental ticket export.
///
/// Positions are totally ordered by `(last_modified, id)`; the derived
/// `Ord` relies on the field declaration order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Last modification time of the ticket this position points at.
    #[serde(rename = "LastModified")]
    pub last_modified: DateTime<Utc>,

    /// Ticket id, used as tie-breaker between equal timestamps.
    #[serde(rename = "ID")]
    pub id: i64,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            last_modified: DateTime::UNIX_EPOCH,
            id: 0,
        }
    }
}

impl Position {
    /// Create a position from its two components.
    pub const fn new(last_modified: DateTime<Utc>, id: i64) -> Self {
        Self { last_modified, id }
    }

    /// Serialize into the persisted byte form.
    pub fn encode(&self) -> ConnectorResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the persisted byte form.
    ///
    /// Empty input is the "start from the beginning" sentinel and yields the
    /// zero position.
    pub fn decode(bytes: &[u8]) -> ConnectorResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|e| ConnectorError::InvalidPosition(e.to_string()))
    }

    /// Whether this is the zero (epoch) position.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}
