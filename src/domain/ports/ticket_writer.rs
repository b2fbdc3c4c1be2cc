use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::ConnectorResult;
use crate::domain::models::ChangeRecord;

/// Bulk write seam of the destination buffer.
#[async_trait]
pub trait TicketWriter: Send {
    /// Submit one batch. Either the whole batch is accepted or an error is
    /// returned.
    async fn write(
        &mut self,
        records: &[ChangeRecord],
        cancel: &CancellationToken,
    ) -> ConnectorResult<()>;

    /// Release any resources held by the writer.
    async fn stop(&mut self) {}
}
