//! Cursor over the Zendesk incremental ticket export.
//!
//! One call to [`ZendeskCursor::fetch_records`] issues at most one HTTP
//! request. Pagination state (`after_url`), the rate-limit cool-down
//! (`next_run`) and the low-water mark (`last_modified_time`) live here and
//! are only touched by whoever owns the cursor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::errors::{ConnectorError, ConnectorResult};
use crate::domain::models::{ChangeRecord, Operation, Position, METADATA_TICKET_STATUS};
use crate::domain::ports::TicketCursor;

use super::client::{retry_after, ZendeskClient, INCREMENTAL_TICKETS_PATH};
use super::models::{IncrementalTicketsResponse, RawTicket};

/// HTTP-backed [`TicketCursor`].
#[derive(Debug, Clone)]
pub struct ZendeskCursor {
    client: ZendeskClient,
    /// Continuation URL; once set it overrides `last_modified_time`.
    after_url: Option<String>,
    /// No request is sent before this instant.
    next_run: Option<DateTime<Utc>>,
    /// Low-water mark used for `start_time` and zero-timestamp correction.
    last_modified_time: DateTime<Utc>,
}

impl ZendeskCursor {
    /// Create a cursor that exports changes made after `start_time`.
    pub const fn new(client: ZendeskClient, start_time: DateTime<Utc>) -> Self {
        Self {
            client,
            after_url: None,
            next_run: None,
            last_modified_time: start_time,
        }
    }

    /// Current continuation URL.
    pub fn after_url(&self) -> Option<&str> {
        self.after_url.as_deref()
    }

    /// End of the current rate-limit cool-down, if any.
    pub const fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    /// Current low-water mark.
    pub const fn last_modified_time(&self) -> DateTime<Utc> {
        self.last_modified_time
    }

    fn request_url(&self) -> String {
        if let Some(after_url) = &self.after_url {
            return after_url.clone();
        }
        // One second past the mark so the boundary ticket is not fetched again.
        let start_time = self.last_modified_time + chrono::Duration::seconds(1);
        format!(
            "{}?start_time={}",
            self.client.endpoint(INCREMENTAL_TICKETS_PATH),
            start_time.timestamp()
        )
    }

    /// Normalize one page of raw tickets into change records.
    ///
    /// Tickets whose `updated_at` is the zero time get the running low-water
    /// mark instead, or their `created_at` when that is set and not older
    /// than the mark, so positions never move backwards.
    pub fn to_records(&self, tickets: Vec<RawTicket>) -> ConnectorResult<Vec<ChangeRecord>> {
        let mut records = Vec::with_capacity(tickets.len());
        let mut last_valid_modified = self.last_modified_time;

        for ticket in tickets {
            let id = ticket_id(&ticket)?;
            let mut updated_at = ticket_time(&ticket, "updated_at", id)?;
            let created_at = ticket_time(&ticket, "created_at", id)?;

            if is_zero_time(updated_at) {
                updated_at = if is_zero_time(created_at) || created_at < last_valid_modified {
                    last_valid_modified
                } else {
                    created_at
                };
                debug!(ticket_id = id, corrected = %updated_at, "corrected zero updated_at");
            }
            if updated_at > last_valid_modified {
                last_valid_modified = updated_at;
            }

            let operation = if created_at == updated_at {
                Operation::Create
            } else {
                Operation::Update
            };
            let status = ticket
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string);

            let payload = serde_json::to_vec(&ticket)?;
            let mut record = ChangeRecord::new(id.to_string(), payload)
                .with_position(Position::new(updated_at, id))
                .with_created_at(created_at)
                .with_operation(operation);
            if let Some(status) = status {
                record = record.with_metadata(METADATA_TICKET_STATUS, status);
            }
            records.push(record);
        }

        Ok(records)
    }
}

#[async_trait]
impl TicketCursor for ZendeskCursor {
    async fn fetch_records(&mut self) -> ConnectorResult<Vec<ChangeRecord>> {
        if let Some(next_run) = self.next_run {
            if next_run > Utc::now() {
                debug!(next_run = %next_run, "rate-limit cool-down in effect, skipping fetch");
                return Ok(Vec::new());
            }
        }

        let url = self.request_url();
        debug!(url = %url, "fetching incremental ticket export");

        let resp = self.client.request(Method::GET, &url).send().await?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(resp.headers())?;
            let wait = chrono::Duration::from_std(wait)
                .map_err(|e| ConnectorError::RetryValueUnavailable(e.to_string()))?;
            let next_run = Utc::now().checked_add_signed(wait).ok_or_else(|| {
                ConnectorError::RetryValueUnavailable(format!(
                    "retry-after of {}s is out of range",
                    wait.num_seconds()
                ))
            })?;
            self.next_run = Some(next_run);
            warn!(
                retry_after_secs = wait.num_seconds(),
                next_run = %next_run,
                "Zendesk rate limit reached, deferring next fetch"
            );
            return Ok(Vec::new());
        }

        if status != StatusCode::OK {
            return Err(ConnectorError::UnexpectedStatus {
                code: status.as_u16(),
                body: String::new(),
            });
        }

        let body = resp.bytes().await?;
        let page: IncrementalTicketsResponse = serde_json::from_slice(&body)?;

        if let Some(after_url) = page.after_url.filter(|u| !u.is_empty()) {
            self.after_url = Some(after_url);
        }

        let records = self.to_records(page.tickets)?;
        debug!(
            count = records.len(),
            end_of_stream = page.end_of_stream,
            "fetched tickets"
        );
        Ok(records)
    }

    fn advance_to(&mut self, last_modified: DateTime<Utc>) {
        self.last_modified_time = last_modified;
    }
}

fn is_zero_time(t: DateTime<Utc>) -> bool {
    t <= DateTime::UNIX_EPOCH
}

fn ticket_id(ticket: &RawTicket) -> ConnectorResult<i64> {
    let value = ticket
        .get("id")
        .ok_or_else(|| ConnectorError::MalformedTicket("missing id".to_string()))?;
    value
        .as_i64()
        .or_else(|| value.as_u64().and_then(|v| i64::try_from(v).ok()))
        .ok_or_else(|| ConnectorError::MalformedTicket(format!("invalid id: {value}")))
}

fn ticket_time(ticket: &RawTicket, field: &str, id: i64) -> ConnectorResult<DateTime<Utc>> {
    let raw = ticket.get(field).and_then(Value::as_str).ok_or_else(|| {
        ConnectorError::MalformedTicket(format!("ticket {id}: missing {field}"))
    })?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ConnectorError::MalformedTicket(format!("ticket {id}: invalid time in {field}: {e}"))
        })
}
