//! Phasegate CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use phasegate::cli::{Cli, Commands};
use phasegate::infrastructure::config::ConfigLoader;
use phasegate::infrastructure::logging::{LogConfig, LoggerImpl};
use phasegate::services::{compose_full_table, definition};

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli) {
        phasegate::cli::handle_error(err, json);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    // Fail loudly on a broken table before touching any task
    compose_full_table().context("Workflow transition table is invalid")?;
    let table = definition();
    tracing::debug!(
        states = table.states().len(),
        rules = table.rules().len(),
        "workflow table ready"
    );

    match cli.command {
        Commands::Task(args) => phasegate::cli::commands::task::execute(args, &config, cli.json),
        Commands::Workflow(args) => {
            phasegate::cli::commands::workflow::execute(args, &config, cli.json)
        }
        Commands::Artifact(args) => {
            phasegate::cli::commands::artifact::execute(args, &config, cli.json)
        }
    }
}
