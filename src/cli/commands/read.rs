//! `read` command: run the source and print records as JSON lines.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::ZendeskSource;
use crate::cli::output::write_json_line;
use crate::domain::errors::ConnectorError;
use crate::domain::models::config::parse_duration;
use crate::domain::models::{ChangeRecord, Config, Operation, Position};
use crate::domain::ports::Source;

use super::interrupt_token;

#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    /// Resume position, e.g. '{"LastModified":"2022-05-08T05:49:55Z","ID":1}'
    #[arg(short, long)]
    pub position: Option<String>,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Pause between reads while no record is ready
    #[arg(long, default_value = "1s")]
    pub backoff: String,
}

/// One record as printed on stdout.
#[derive(Debug, Serialize)]
pub struct RecordLine<'a> {
    pub key: &'a str,
    pub operation: Operation,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub metadata: &'a BTreeMap<String, String>,
    pub payload: Value,
}

impl<'a> From<&'a ChangeRecord> for RecordLine<'a> {
    fn from(record: &'a ChangeRecord) -> Self {
        let payload = serde_json::from_slice(&record.payload)
            .unwrap_or_else(|_| Value::String(record.payload_text()));
        Self {
            key: &record.key,
            operation: record.operation,
            position: record.position,
            created_at: record.created_at,
            metadata: &record.metadata,
            payload,
        }
    }
}

pub async fn execute(args: ReadArgs, config: &Config) -> Result<()> {
    let backoff = parse_duration(&args.backoff)
        .with_context(|| format!("Invalid backoff duration: {}", args.backoff))?;

    let mut source = ZendeskSource::new();
    source
        .configure(&config.source_settings_map())
        .await
        .context("Failed to configure source")?;
    source
        .open(args.position.as_deref().unwrap_or_default().as_bytes())
        .await
        .context("Failed to open source")?;

    let cancel = interrupt_token();
    let result = stream(&source, args.limit, backoff, &cancel).await;
    source.teardown().await.context("Failed to tear down source")?;

    let count = result?;
    info!(records = count, "read finished");
    Ok(())
}

async fn stream(
    source: &ZendeskSource,
    limit: Option<usize>,
    backoff: Duration,
    cancel: &CancellationToken,
) -> Result<usize> {
    let mut count = 0;
    while limit.is_none_or(|limit| count < limit) {
        match source.read(cancel).await {
            Ok(record) => {
                write_json_line(&mut std::io::stdout(), &RecordLine::from(&record))?;
                source.ack(&record.position.encode()?).await?;
                count += 1;
            }
            Err(ConnectorError::BackoffRetry) => {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(backoff) => {}
                }
            }
            Err(ConnectorError::Cancelled) if cancel.is_cancelled() => break,
            Err(err) => return Err(err).context("Failed to read from source"),
        }
    }
    Ok(count)
}
