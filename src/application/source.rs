//! Zendesk source façade.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::zendesk::{ZendeskClient, ZendeskCursor};
use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::{ChangeRecord, Position, SourceConfig};
use crate::domain::ports::{RecordIterator, Source};
use crate::services::CdcIterator;

/// Change-data-capture source over the incremental ticket export.
#[derive(Default)]
pub struct ZendeskSource {
    config: Option<SourceConfig>,
    iterator: Option<Box<dyn RecordIterator>>,
}

impl std::fmt::Debug for ZendeskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZendeskSource")
            .field("config", &self.config)
            .field("open", &self.iterator.is_some())
            .finish()
    }
}

impl ZendeskSource {
    /// Create an unconfigured source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source reading from an existing iterator.
    pub fn with_iterator(iterator: Box<dyn RecordIterator>) -> Self {
        Self {
            config: None,
            iterator: Some(iterator),
        }
    }

    /// Parsed configuration, once configured.
    pub const fn config(&self) -> Option<&SourceConfig> {
        self.config.as_ref()
    }
}

#[async_trait]
impl Source for ZendeskSource {
    async fn configure(&mut self, cfg: &HashMap<String, String>) -> ConnectorResult<()> {
        let config = SourceConfig::parse(cfg)?;
        info!(
            domain = %config.connection.domain,
            polling_period_ms = config.polling_period.as_millis(),
            "source configured"
        );
        self.config = Some(config);
        Ok(())
    }

    async fn open(&mut self, position: &[u8]) -> ConnectorResult<()> {
        let config = self.config.as_ref().ok_or(ConnectorError::NotConfigured)?;
        let position = Position::decode(position)?;

        let client = ZendeskClient::from_config(&config.connection)?;
        let cursor = ZendeskCursor::new(client, position.last_modified);
        if let Some(previous) = self.iterator.take() {
            previous.shutdown().await;
        }
        self.iterator = Some(Box::new(CdcIterator::new(cursor, config.polling_period)));

        info!(
            last_modified = %position.last_modified,
            id = position.id,
            "source opened"
        );
        Ok(())
    }

    async fn read(&self, cancel: &CancellationToken) -> ConnectorResult<ChangeRecord> {
        let iterator = self.iterator.as_ref().ok_or(ConnectorError::NotOpened)?;
        if !iterator.has_next() {
            return Err(ConnectorError::BackoffRetry);
        }
        iterator.next(cancel).await
    }

    async fn ack(&self, position: &[u8]) -> ConnectorResult<()> {
        let position = Position::decode(position)?;
        info!(
            id = position.id,
            update_time = %position.last_modified,
            "ack received"
        );
        Ok(())
    }

    async fn teardown(&mut self) -> ConnectorResult<()> {
        info!("shutting down zendesk source");
        if let Some(iterator) = self.iterator.take() {
            iterator.shutdown().await;
        }
        Ok(())
    }
}
