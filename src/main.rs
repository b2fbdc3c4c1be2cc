//! Zendesk connector CLI entry point.

use anyhow::Result;
use clap::Parser;

use zendesk_connector::cli::commands::{read, spec, write};
use zendesk_connector::cli::{Cli, Commands};
use zendesk_connector::infrastructure::config::ConfigLoader;
use zendesk_connector::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli).await {
        zendesk_connector::cli::handle_error(err, cli.json);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&config.logging)?;

    match &cli.command {
        Commands::Spec => spec::execute(cli.json),
        Commands::Read(args) => read::execute(args.clone(), &config).await,
        Commands::Write(args) => write::execute(args.clone(), &config, cli.json).await,
    }
}
