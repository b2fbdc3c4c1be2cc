//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::read::ReadArgs;
use super::commands::write::WriteArgs;

#[derive(Parser, Debug)]
#[command(name = "zendesk-connector")]
#[command(about = "Zendesk ticket source and destination connector", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file (defaults to ./zendesk-connector.yaml)
    #[arg(short, long, global = true, env = "ZENDESK_CONNECTOR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the connector specification
    Spec,

    /// Stream ticket changes to stdout as JSON lines
    Read(ReadArgs),

    /// Import tickets read as JSON lines from a file or stdin
    Write(WriteArgs),
}
