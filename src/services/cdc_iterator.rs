//! Change-data-capture polling engine.
//!
//! Two tasks run per iterator:
//! - `poll` fetches a batch from the cursor on every tick and hands it to
//!   the batch cache (capacity one batch)
//! - `fan_out` drains the cache into the record buffer (capacity one record)
//!
//! Consumers pull from the record buffer through [`RecordIterator`]. A fetch
//! error kills the task group and is reported by the next call to `next`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::ChangeRecord;
use crate::domain::ports::{RecordIterator, TicketCursor};

use super::task_group::TaskGroup;

/// Polling [`RecordIterator`] over a [`TicketCursor`].
#[derive(Debug)]
pub struct CdcIterator {
    group: TaskGroup,
    buffer: Mutex<mpsc::Receiver<ChangeRecord>>,
}

impl CdcIterator {
    /// Start polling `cursor` every `polling_period`.
    ///
    /// The first fetch happens immediately. Must be called inside a Tokio
    /// runtime.
    pub fn new<C>(cursor: C, polling_period: Duration) -> Self
    where
        C: TicketCursor + 'static,
    {
        let group = TaskGroup::new();
        let (cache_tx, cache_rx) = mpsc::channel(1);
        let (buffer_tx, buffer_rx) = mpsc::channel(1);

        group.spawn("poll", poll(group.clone(), cursor, polling_period, cache_tx));
        group.spawn("fan_out", fan_out(group.clone(), cache_rx, buffer_tx));

        info!(polling_period_ms = polling_period.as_millis(), "CDC iterator started");
        Self {
            group,
            buffer: Mutex::new(buffer_rx),
        }
    }

    fn cause(&self) -> ConnectorError {
        self.group.err().unwrap_or(ConnectorError::IteratorStopped)
    }
}

#[async_trait]
impl RecordIterator for CdcIterator {
    fn has_next(&self) -> bool {
        let ready = self
            .buffer
            .try_lock()
            .is_ok_and(|buffer| !buffer.is_empty());
        ready || !self.group.is_alive()
    }

    async fn next(&self, cancel: &CancellationToken) -> ConnectorResult<ChangeRecord> {
        let mut buffer = tokio::select! {
            biased;
            () = self.group.dying() => return Err(self.cause()),
            () = cancel.cancelled() => return Err(ConnectorError::Cancelled),
            buffer = self.buffer.lock() => buffer,
        };

        tokio::select! {
            biased;
            () = self.group.dying() => Err(self.cause()),
            () = cancel.cancelled() => Err(ConnectorError::Cancelled),
            record = buffer.recv() => match record {
                Some(record) => Ok(record),
                // Producers are gone, so the group is dying; wait for its cause.
                None => tokio::select! {
                    biased;
                    () = self.group.dying() => Err(self.cause()),
                    () = cancel.cancelled() => Err(ConnectorError::Cancelled),
                },
            },
        }
    }

    fn stop(&self) {
        if self.group.is_alive() {
            info!("stopping CDC iterator");
        }
        self.group.kill(ConnectorError::IteratorStopped);
    }

    async fn shutdown(&self) {
        self.stop();
        self.group.wait().await;
    }
}

impl Drop for CdcIterator {
    fn drop(&mut self) {
        self.group.kill(ConnectorError::IteratorStopped);
    }
}

async fn poll<C>(
    group: TaskGroup,
    mut cursor: C,
    polling_period: Duration,
    caches: mpsc::Sender<Vec<ChangeRecord>>,
) -> ConnectorResult<()>
where
    C: TicketCursor,
{
    let mut ticker = tokio::time::interval(polling_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = group.dying() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let records = tokio::select! {
            biased;
            () = group.dying() => return Ok(()),
            result = cursor.fetch_records() => result?,
        };
        let Some(last_modified) = records.last().map(|r| r.position.last_modified) else {
            continue;
        };
        let count = records.len();

        tokio::select! {
            biased;
            () = group.dying() => return Ok(()),
            sent = caches.send(records) => {
                if sent.is_err() {
                    return Ok(());
                }
            }
        }
        cursor.advance_to(last_modified);
        debug!(count, last_modified = %last_modified, "batch cached");
    }
}

async fn fan_out(
    group: TaskGroup,
    mut caches: mpsc::Receiver<Vec<ChangeRecord>>,
    buffer: mpsc::Sender<ChangeRecord>,
) -> ConnectorResult<()> {
    loop {
        let batch = tokio::select! {
            biased;
            () = group.dying() => return Ok(()),
            batch = caches.recv() => match batch {
                Some(batch) => batch,
                None => return Ok(()),
            },
        };

        for record in batch {
            tokio::select! {
                biased;
                () = group.dying() => return Ok(()),
                sent = buffer.send(record) => {
                    if sent.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}
