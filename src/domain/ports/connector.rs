//! Plugin contract between the connector and the pipeline runtime.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::ConnectorResult;
use crate::domain::models::ChangeRecord;

/// Acknowledgement callback handed over with every destination write.
pub type AckFn = Box<dyn FnOnce() -> ConnectorResult<()> + Send>;

/// Change-data-capture source.
#[async_trait]
pub trait Source: Send + Sync {
    /// Parse the runtime configuration map.
    async fn configure(&mut self, cfg: &HashMap<String, String>) -> ConnectorResult<()>;

    /// Start streaming from `position`. Empty bytes start from the beginning.
    async fn open(&mut self, position: &[u8]) -> ConnectorResult<()>;

    /// Return the next record, or [`BackoffRetry`] when none is ready.
    ///
    /// [`BackoffRetry`]: crate::domain::errors::ConnectorError::BackoffRetry
    async fn read(&self, cancel: &CancellationToken) -> ConnectorResult<ChangeRecord>;

    /// Acknowledge that the runtime has processed up to `position`.
    async fn ack(&self, position: &[u8]) -> ConnectorResult<()>;

    /// Stop streaming and release resources.
    async fn teardown(&mut self) -> ConnectorResult<()>;
}

/// Batching destination.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Parse the runtime configuration map.
    async fn configure(&mut self, cfg: &HashMap<String, String>) -> ConnectorResult<()>;

    /// Prepare the writer.
    async fn open(&mut self) -> ConnectorResult<()>;

    /// Buffer `record`; `ack` runs once the record has been written.
    async fn write_async(
        &self,
        cancel: &CancellationToken,
        record: ChangeRecord,
        ack: AckFn,
    ) -> ConnectorResult<()>;

    /// Write everything buffered so far.
    async fn flush(&self, cancel: &CancellationToken) -> ConnectorResult<()>;

    /// Flush what is left and release the writer.
    async fn teardown(&self, cancel: &CancellationToken) -> ConnectorResult<()>;
}
