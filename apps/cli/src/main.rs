//! `strata`: manage layered configuration documents from the command line.

mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use strata::Strata;
use strata_kernel::config::load_strata_config;
use strata_logger::Logger;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_strata_config(cli.config.as_deref()).context("Critical: Configuration is malformed")?;
    let _logger = Logger::from_config(&config.logging)?;
    debug!(backend = ?config.storage.backend, root = %config.storage.root.display(), "Configuration loaded");

    let strata = Strata::connect(&config).await?;
    let mut out = std::io::stdout().lock();
    commands::execute(&strata, cli.command, config.output.format, &mut out).await
}
