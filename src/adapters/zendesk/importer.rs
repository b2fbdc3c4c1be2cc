//! Bulk ticket import for the destination side.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::ChangeRecord;
use crate::domain::ports::TicketWriter;

use super::client::{retry_after, ZendeskClient, CREATE_MANY_PATH};
use super::models::{CreateManyRequest, JobStatusResponse, RawTicket};

/// Wait used when a 429 response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// [`TicketWriter`] backed by `POST /api/v2/imports/tickets/create_many`.
#[derive(Debug)]
pub struct BulkImporter {
    client: Option<ZendeskClient>,
    url: String,
    max_retries: u32,
    /// Wait used when a 429 carries no usable `Retry-After`.
    default_retry_after: Duration,
    /// Consecutive 429 responses since the last other outcome.
    retry_count: u32,
}

impl BulkImporter {
    /// Create an importer allowing `max_retries` rate-limit retries per batch.
    pub fn new(client: ZendeskClient, max_retries: u32) -> Self {
        let url = client.endpoint(CREATE_MANY_PATH);
        Self {
            client: Some(client),
            url,
            max_retries,
            default_retry_after: DEFAULT_RETRY_AFTER,
            retry_count: 0,
        }
    }

    /// Replace the wait used when a 429 response has no usable `Retry-After`.
    #[must_use]
    pub fn with_default_retry_after(mut self, wait: Duration) -> Self {
        self.default_retry_after = wait;
        self
    }

    /// Consecutive rate-limited attempts so far.
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Configured retry bound.
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Build the `create_many` body. Payloads must be JSON objects.
pub fn encode_batch(records: &[ChangeRecord]) -> ConnectorResult<Vec<u8>> {
    let tickets = records
        .iter()
        .map(|record| {
            serde_json::from_slice::<RawTicket>(&record.payload).map_err(|e| {
                ConnectorError::Serialization(format!(
                    "record {}: payload is not a ticket object: {e}",
                    record.key
                ))
            })
        })
        .collect::<ConnectorResult<Vec<_>>>()?;
    Ok(serde_json::to_vec(&CreateManyRequest { tickets })?)
}

#[async_trait]
impl TicketWriter for BulkImporter {
    async fn write(
        &mut self,
        records: &[ChangeRecord],
        cancel: &CancellationToken,
    ) -> ConnectorResult<()> {
        let client = self.client.clone().ok_or(ConnectorError::NotOpened)?;
        let body = encode_batch(records)?;

        loop {
            debug!(count = records.len(), attempt = self.retry_count + 1, "posting bulk import");
            let sent = client
                .request(Method::POST, &self.url)
                .header(CONTENT_TYPE, "application/json; charset=UTF-8")
                .body(body.clone())
                .send()
                .await;
            let resp = match sent {
                Ok(resp) => resp,
                Err(err) => {
                    self.retry_count = 0;
                    return Err(err.into());
                }
            };
            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let default_wait = self.default_retry_after;
                let wait = retry_after(resp.headers()).unwrap_or_else(|e| {
                    warn!(error = %e, default_secs = default_wait.as_secs(), "using default retry-after");
                    default_wait
                });

                if self.retry_count >= self.max_retries {
                    return Err(ConnectorError::RateLimitExceeded {
                        retry_count: self.retry_count,
                    });
                }
                self.retry_count += 1;
                warn!(
                    retry_count = self.retry_count,
                    max_retries = self.max_retries,
                    wait_secs = wait.as_secs(),
                    "Zendesk rate limit reached, retrying bulk import"
                );

                tokio::select! {
                    () = cancel.cancelled() => return Err(ConnectorError::Cancelled),
                    () = tokio::time::sleep(wait) => {}
                }
                continue;
            }

            self.retry_count = 0;

            if status != StatusCode::OK {
                let body = read_body(resp).await;
                return Err(ConnectorError::UnexpectedStatus {
                    code: status.as_u16(),
                    body,
                });
            }

            let text = read_body(resp).await;
            match serde_json::from_str::<JobStatusResponse>(&text) {
                Ok(job) => info!(
                    count = records.len(),
                    job_id = job.job_status.id.as_deref().unwrap_or_default(),
                    job_status = job.job_status.status.as_deref().unwrap_or_default(),
                    "bulk import accepted"
                ),
                Err(_) => info!(count = records.len(), "bulk import accepted"),
            }
            return Ok(());
        }
    }

    async fn stop(&mut self) {
        self.client = None;
    }
}

/// Response body as text; a failed read is logged and yields an empty body.
async fn read_body(resp: reqwest::Response) -> String {
    resp.text().await.unwrap_or_else(|e| {
        warn!(error = %e, "failed to read response body");
        String::new()
    })
}
