//! Destination write buffer.
//!
//! Records accumulate under one lock until the batch size is reached, then
//! the whole batch goes to the [`TicketWriter`] while the lock is still held.
//! Acknowledgements run only after the writer accepted the batch, in the
//! order the records arrived. The first failed write makes the buffer
//! unusable until it is rebuilt.

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::ChangeRecord;
use crate::domain::ports::{AckFn, TicketWriter};

struct BufferState {
    records: Vec<ChangeRecord>,
    acks: Vec<AckFn>,
    writer: Option<Box<dyn TicketWriter>>,
    /// Sticky failure of an earlier flush.
    error: Option<ConnectorError>,
}

/// Batching front of a [`TicketWriter`].
pub struct WriteBuffer {
    state: Mutex<BufferState>,
    batch_size: usize,
}

impl std::fmt::Debug for WriteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBuffer")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl WriteBuffer {
    /// Wrap `writer`, flushing every `batch_size` records.
    pub fn new(writer: Box<dyn TicketWriter>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            state: Mutex::new(BufferState {
                records: Vec::with_capacity(batch_size),
                acks: Vec::with_capacity(batch_size),
                writer: Some(writer),
                error: None,
            }),
            batch_size,
        }
    }

    /// Number of records waiting for the next flush.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// The sticky error, if an earlier flush failed.
    pub async fn error(&self) -> Option<ConnectorError> {
        self.state.lock().await.error.clone()
    }

    /// Buffer `record` and flush once the batch is full.
    ///
    /// Records with an empty payload are not sent; their acknowledgement
    /// still occupies a slot and runs with the next successful flush.
    pub async fn write_async(
        &self,
        record: ChangeRecord,
        ack: AckFn,
        cancel: &CancellationToken,
    ) -> ConnectorResult<()> {
        let mut state = self.state.lock().await;
        if let Some(err) = &state.error {
            return Err(err.clone());
        }
        if state.writer.is_none() {
            return Err(ConnectorError::NotOpened);
        }

        if record.payload.is_empty() {
            debug!(key = %record.key, "skipping record with empty payload");
        } else {
            state.records.push(record);
        }
        state.acks.push(ack);

        if state.acks.len() >= self.batch_size {
            flush_locked(&mut state, cancel).await?;
        }
        Ok(())
    }

    /// Write everything buffered so far.
    pub async fn flush(&self, cancel: &CancellationToken) -> ConnectorResult<()> {
        let mut state = self.state.lock().await;
        flush_locked(&mut state, cancel).await
    }

    /// Flush what is left and release the writer. A no-op once torn down.
    pub async fn teardown(&self, cancel: &CancellationToken) -> ConnectorResult<()> {
        let mut state = self.state.lock().await;
        if state.writer.is_none() {
            return Ok(());
        }
        let result = flush_locked(&mut state, cancel).await;

        if let Some(mut writer) = state.writer.take() {
            writer.stop().await;
        }
        if let Err(err) = &result {
            warn!(
                error = %err,
                pending = state.records.len(),
                "final flush failed, dropping buffered records"
            );
        }
        state.records.clear();
        state.acks.clear();
        info!("write buffer torn down");
        result
    }
}

async fn flush_locked(
    state: &mut BufferState,
    cancel: &CancellationToken,
) -> ConnectorResult<()> {
    if let Some(err) = &state.error {
        return Err(err.clone());
    }
    if state.records.is_empty() && state.acks.is_empty() {
        return Ok(());
    }

    let records = std::mem::take(&mut state.records);
    let acks = std::mem::take(&mut state.acks);

    if !records.is_empty() {
        let Some(writer) = state.writer.as_mut() else {
            state.records = records;
            state.acks = acks;
            return Err(ConnectorError::NotOpened);
        };
        if let Err(err) = writer.write(&records, cancel).await {
            warn!(error = %err, count = records.len(), "bulk write failed");
            state.records = records;
            state.acks = acks;
            state.error = Some(err.clone());
            return Err(err);
        }
        debug!(count = records.len(), "batch written");
    }

    for ack in acks {
        ack()?;
    }
    Ok(())
}
