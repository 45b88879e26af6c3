//! CLI module for the document retrieval service.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::anyhow;

pub use args::{Cli, Commands};

use crate::config::Settings;

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow!("Configuration error: {e}"))?;

    settings.validate()?;
    Ok(settings)
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init { force } = cli.command {
        crate::logging::init();
        return commands::init::run_init(force);
    }

    let settings = load_settings(&cli)?;
    crate::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Ingest { files, id } => commands::ingest::run(&settings, &files, id.as_deref()),
        Commands::Query {
            question,
            k,
            answer,
            json,
        } => commands::query::run(&settings, &question, k, answer, json).await,
        Commands::Serve { bind } => commands::serve::run(settings, bind).await,
        Commands::Status { json } => commands::status::run(&settings, json),
        Commands::Config => commands::init::run_config(&settings),
    }
}
