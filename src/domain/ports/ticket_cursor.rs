use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::ConnectorResult;
use crate::domain::models::ChangeRecord;

/// Fetch seam of the polling engine.
///
/// Implementations own their pagination state; only the polling task calls
/// into a cursor.
#[async_trait]
pub trait TicketCursor: Send {
    /// Fetch the next page of changes.
    ///
    /// An empty result is not an error: it means nothing is available yet
    /// (no new changes, or a rate-limit cool-down is in effect).
    async fn fetch_records(&mut self) -> ConnectorResult<Vec<ChangeRecord>>;

    /// Move the low-water mark forward after a batch has been handed off.
    fn advance_to(&mut self, last_modified: DateTime<Utc>);
}
