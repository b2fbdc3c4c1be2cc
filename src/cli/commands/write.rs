//! `write` command: import tickets read as JSON lines.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::application::ZendeskDestination;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ChangeRecord, Config};
use crate::domain::ports::Destination;

use super::interrupt_token;

#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// JSON-lines file with one ticket object per line (stdin when omitted)
    pub input: Option<PathBuf>,
}

/// Outcome of a `write` run.
#[derive(Debug, Default, Serialize)]
pub struct WriteSummary {
    pub submitted: usize,
    pub acknowledged: usize,
    pub skipped_lines: usize,
}

impl CommandOutput for WriteSummary {
    fn to_human(&self) -> String {
        format!(
            "Submitted {} ticket(s), {} acknowledged, {} blank line(s) skipped",
            self.submitted, self.acknowledged, self.skipped_lines
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: WriteArgs, config: &Config, json_mode: bool) -> Result<()> {
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut destination = ZendeskDestination::new();
    destination
        .configure(&config.destination_settings_map())
        .await
        .context("Failed to configure destination")?;
    destination.open().await.context("Failed to open destination")?;

    let cancel = interrupt_token();
    let acknowledged = Arc::new(AtomicUsize::new(0));
    let result = submit(&destination, reader, &cancel, &acknowledged).await;
    let teardown = destination.teardown(&cancel).await;

    let mut summary = result?;
    teardown.context("Final flush failed")?;
    summary.acknowledged = acknowledged.load(Ordering::SeqCst);
    output(&summary, json_mode);
    Ok(())
}

async fn submit(
    destination: &ZendeskDestination,
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    cancel: &CancellationToken,
    acknowledged: &Arc<AtomicUsize>,
) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if cancel.is_cancelled() {
            break;
        }
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            summary.skipped_lines += 1;
            continue;
        }
        serde_json::from_str::<Map<String, Value>>(line)
            .with_context(|| format!("Line {line_number} is not a JSON ticket object"))?;

        let counter = Arc::clone(acknowledged);
        destination
            .write_async(
                cancel,
                ChangeRecord::new(line_number.to_string(), line.as_bytes().to_vec()),
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .with_context(|| format!("Failed to write line {line_number}"))?;
        summary.submitted += 1;
    }

    destination.flush(cancel).await.context("Failed to flush tickets")?;
    Ok(summary)
}
