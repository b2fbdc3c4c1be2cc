//! Zendesk API response and request models.
//!
//! Tickets are kept as untyped JSON objects: the connector only inspects
//! `id`, `created_at`, `updated_at` and `status`, and forwards everything
//! else untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw ticket object.
pub type RawTicket = Map<String, Value>;

/// One page of the cursor-based incremental ticket export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncrementalTicketsResponse {
    /// Continuation URL for the next page, if any.
    #[serde(default)]
    pub after_url: Option<String>,
    /// Opaque cursor backing `after_url`.
    #[serde(default)]
    pub after_cursor: Option<String>,
    /// Whether the export has caught up with the present.
    #[serde(default)]
    pub end_of_stream: bool,
    /// Changed tickets in upstream order.
    #[serde(default)]
    pub tickets: Vec<RawTicket>,
}

/// Request body of `POST /api/v2/imports/tickets/create_many`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateManyRequest {
    /// Tickets to import.
    pub tickets: Vec<RawTicket>,
}

/// Background job accepted by a bulk import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job status envelope.
    #[serde(default)]
    pub job_status: JobStatus,
}

/// Status of an asynchronous Zendesk job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Job state, e.g. `queued` or `completed`.
    #[serde(default)]
    pub status: Option<String>,
    /// URL to poll for progress.
    #[serde(default)]
    pub url: Option<String>,
}
