//! Scribe CLI: batch uploader for blog images and article bodies.
//!
//! Configuration comes from `SCRIBE_*` environment variables (or a `.env` file).

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use scribe_api_client::ApiClient;
use scribe_cli::{format_catalog_table, init_tracing, load_files, validator_for, watch_events};
use scribe_core::IngestConfig;
use scribe_ingest::IngestOrchestrator;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scribe", about = "Scribe asset ingestion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress, upload and register a batch of files
    Upload {
        /// Files to upload (images or Markdown article bodies)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Accept images only
        #[arg(long, conflicts_with = "documents_only")]
        images_only: bool,
        /// Accept Markdown documents only
        #[arg(long)]
        documents_only: bool,
    },
    /// List registered catalog entries
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: ListFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListFormat {
    Json,
    Table,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn list_catalog(client: &ApiClient, format: ListFormat) -> anyhow::Result<()> {
    let records = client
        .list_catalog()
        .await
        .context("Failed to list catalog")?;
    match format {
        ListFormat::Json => print_json(&records)?,
        ListFormat::Table => print!("{}", format_catalog_table(&records)),
    }
    Ok(())
}

async fn upload(
    config: &IngestConfig,
    files: Vec<PathBuf>,
    images_only: bool,
    documents_only: bool,
) -> anyhow::Result<()> {
    let orchestrator =
        IngestOrchestrator::from_config(config, validator_for(images_only, documents_only))
            .context("Failed to build ingestion pipeline")?;
    let watcher = tokio::spawn(watch_events(orchestrator.subscribe()));

    let outcome = orchestrator.submit(load_files(&files)?);
    for rejected in &outcome.rejected {
        tracing::warn!(name = %rejected.name, error = %rejected.error, "File rejected");
    }
    if outcome.accepted.is_empty() {
        anyhow::bail!("None of the given files can be uploaded");
    }

    orchestrator.wait_for_compression().await;
    let report = orchestrator.commit().await;

    print_json(&serde_json::json!({
        "report": report,
        "rejected": outcome.rejected,
        "batch": orchestrator.snapshot(),
    }))?;

    // Closing the batch ends the event stream.
    drop(orchestrator);
    let catalog_changed = watcher.await.context("Event listener failed")?;

    if catalog_changed {
        let client = ApiClient::from_config(config).context("Failed to create API client")?;
        list_catalog(&client, ListFormat::Json).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = IngestConfig::from_env()
        .context("Invalid configuration. Check the SCRIBE_* environment variables")?;

    match cli.command {
        Commands::Upload {
            files,
            images_only,
            documents_only,
        } => upload(&config, files, images_only, documents_only).await?,
        Commands::List { format } => {
            let client = ApiClient::from_config(&config).context("Failed to create API client")?;
            list_catalog(&client, format).await?;
        }
    }

    Ok(())
}
