//! Zendesk destination façade.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::zendesk::{BulkImporter, ZendeskClient};
use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::{ChangeRecord, DestinationConfig};
use crate::domain::ports::{AckFn, Destination, TicketWriter};
use crate::services::WriteBuffer;

/// Batching destination over the bulk ticket import.
#[derive(Debug, Default)]
pub struct ZendeskDestination {
    config: Option<DestinationConfig>,
    buffer: Option<WriteBuffer>,
}

impl ZendeskDestination {
    /// Create an unconfigured destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed configuration, once configured.
    pub const fn config(&self) -> Option<&DestinationConfig> {
        self.config.as_ref()
    }

    /// Open with a custom writer instead of the bulk importer.
    pub fn open_with_writer(&mut self, writer: Box<dyn TicketWriter>) -> ConnectorResult<()> {
        let config = self.config.as_ref().ok_or(ConnectorError::NotConfigured)?;
        self.buffer = Some(WriteBuffer::new(writer, config.buffer_size));
        Ok(())
    }

    fn buffer(&self) -> ConnectorResult<&WriteBuffer> {
        self.buffer.as_ref().ok_or(ConnectorError::NotOpened)
    }
}

#[async_trait]
impl Destination for ZendeskDestination {
    async fn configure(&mut self, cfg: &HashMap<String, String>) -> ConnectorResult<()> {
        let config = DestinationConfig::parse(cfg)?;
        info!(
            domain = %config.connection.domain,
            buffer_size = config.buffer_size,
            max_retries = config.max_retries,
            "destination configured"
        );
        self.config = Some(config);
        Ok(())
    }

    async fn open(&mut self) -> ConnectorResult<()> {
        let config = self.config.as_ref().ok_or(ConnectorError::NotConfigured)?;
        let client = ZendeskClient::from_config(&config.connection)?;
        let importer = BulkImporter::new(client, config.max_retries);
        self.open_with_writer(Box::new(importer))?;
        info!("destination opened");
        Ok(())
    }

    async fn write_async(
        &self,
        cancel: &CancellationToken,
        record: ChangeRecord,
        ack: AckFn,
    ) -> ConnectorResult<()> {
        self.buffer()?.write_async(record, ack, cancel).await
    }

    async fn flush(&self, cancel: &CancellationToken) -> ConnectorResult<()> {
        self.buffer()?.flush(cancel).await
    }

    async fn teardown(&self, cancel: &CancellationToken) -> ConnectorResult<()> {
        match &self.buffer {
            Some(buffer) => buffer.teardown(cancel).await,
            None => Ok(()),
        }
    }
}
