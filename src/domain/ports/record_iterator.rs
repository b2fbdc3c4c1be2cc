use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::ConnectorResult;
use crate::domain::models::ChangeRecord;

/// Pull side of the change stream.
#[async_trait]
pub trait RecordIterator: Send + Sync {
    /// Lookahead: a record is ready, or the stream has terminated and
    /// `next` will report why.
    fn has_next(&self) -> bool;

    /// Wait for the next record, the stream's terminal error, or `cancel`.
    async fn next(&self, cancel: &CancellationToken) -> ConnectorResult<ChangeRecord>;

    /// Stop producing records. Pending and later `next` calls fail promptly.
    fn stop(&self);

    /// Stop and wait for background work to finish.
    async fn shutdown(&self) {
        self.stop();
    }
}
