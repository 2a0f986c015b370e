mod commands;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ApiClient, ConsoleContext, SystemClock};
use storage::SqliteStore;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    commands::{Command, Console},
    config::{load_settings, normalize_database_url},
};

#[derive(Parser, Debug)]
#[command(
    name = "brokerage-console",
    about = "Operator console for brokerage companies, industries, benefits and schemes"
)]
struct Args {
    /// Overrides `api_base_url` from console.toml and the environment.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(url) = args.database_url {
        settings.database_url = url;
    }

    let database_url = normalize_database_url(&settings.database_url);
    let store = SqliteStore::new(&database_url)
        .await
        .with_context(|| format!("failed to open console state at '{database_url}'"))?;
    store.health_check().await?;
    debug!(database_url = %database_url, api = %settings.api_base_url, "console starting");

    let context = ConsoleContext::init(Arc::new(store), Arc::new(SystemClock), settings.cache_ttl())
        .await
        .context("failed to load console state")?;
    let api = Arc::new(ApiClient::new(&settings.api_base_url)?);

    Console::new(api, context, settings).run(args.command).await
}
