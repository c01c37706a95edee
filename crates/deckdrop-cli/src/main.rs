//! Deckdrop CLI: segment text into slides and publish decks to the configured backend.
//!
//! Backend selection and credentials come from the environment (or `.env`);
//! see `STORAGE_BACKEND`. Every command prints JSON to stdout, failures included,
//! and exits non-zero when it fails.

use anyhow::Context;
use clap::{Parser, Subcommand};
use deckdrop_cli::{init_tracing, read_text, report_failure, to_app_error, upload_name};
use deckdrop_core::{AppError, Config, Strategy};
use deckdrop_services::{
    create_storage, segment_named, CleanupService, DeckPipeline, MarkdownDeckRenderer,
    PublishRequest, SegmentationError,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "deckdrop", about = "Turn text into slide decks with shareable links")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split text into slide segments without storing anything
    Segment {
        /// Text file; stdin when omitted or `-`
        input: Option<PathBuf>,
        /// paragraph, topic, length or keyword
        #[arg(long, default_value = "paragraph")]
        strategy: String,
    },
    /// Segment, render and upload a deck
    Publish {
        /// Text file; stdin when omitted or `-`
        input: Option<PathBuf>,
        #[arg(long, default_value = "paragraph")]
        strategy: String,
        /// Deck title; defaults to the first slide's title
        #[arg(long)]
        title: Option<String>,
    },
    /// Upload an already rendered deck
    Upload {
        file: PathBuf,
        /// Name to store the file under
        #[arg(long)]
        name: Option<String>,
    },
    /// Look up a stored deck by id
    Get { id: String },
    /// List unexpired decks, newest first
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Delete a stored deck by id
    Delete { id: String },
    /// Remove expired decks
    Sweep {
        /// Keep sweeping every CLEANUP_INTERVAL_SECS until interrupted
        #[arg(long)]
        watch: bool,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&to_app_error(err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Segmentation is pure; it needs no backend configuration
    if let Commands::Segment { input, strategy } = &cli.command {
        let text = read_text(input.as_deref())?;
        let result = segment_named(&text, strategy)?;
        return print_json(&result);
    }

    let config = Config::from_env().map_err(|e| AppError::Configuration(format!("{:#}", e)))?;
    tracing::debug!(
        environment = %config.environment,
        backend = %config.storage_backend(),
        "Configuration loaded"
    );
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    match cli.command {
        Commands::Segment { .. } => {}
        Commands::Publish {
            input,
            strategy,
            title,
        } => {
            let strategy = strategy
                .parse::<Strategy>()
                .map_err(|_| SegmentationError::UnknownStrategy(strategy.clone()))?;
            let text = read_text(input.as_deref())?;
            let pipeline = DeckPipeline::new(storage, Arc::new(MarkdownDeckRenderer));
            let outcome = pipeline
                .publish(PublishRequest {
                    title,
                    text,
                    strategy,
                })
                .await?;
            print_json(&outcome)?;
        }
        Commands::Upload { file, name } => {
            let filename = upload_name(&file, name)?;
            let response = storage.upload_file(&file, &filename).await?;
            print_json(&response)?;
        }
        Commands::Get { id } => match storage.get_file(&id).await? {
            Some(record) => print_json(&record)?,
            None => return Err(AppError::NotFound(format!("No live deck with id {}", id)).into()),
        },
        Commands::List { limit } => {
            let records = storage.list_files(limit).await?;
            print_json(&records)?;
        }
        Commands::Delete { id } => {
            storage.delete_file(&id).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("Deck {} deleted", id) }),
            )?;
        }
        Commands::Sweep { watch } => {
            if !watch {
                let sweeper = CleanupService::new(storage, Duration::ZERO);
                let removed = sweeper.run_once().await?;
                print_json(&serde_json::json!({ "removed": removed }))?;
                return Ok(());
            }

            if config.cleanup_interval_secs == 0 {
                return Err(AppError::InvalidInput(
                    "CLEANUP_INTERVAL_SECS is 0; periodic sweeping is disabled".to_string(),
                )
                .into());
            }
            let sweeper = Arc::new(CleanupService::new(
                storage,
                Duration::from_secs(config.cleanup_interval_secs),
            ));
            let mut handle = sweeper.start();

            let interrupted = tokio::select! {
                _ = tokio::signal::ctrl_c() => true,
                result = &mut handle => {
                    result.context("Expiry sweep task panicked")?;
                    false
                }
            };
            if interrupted {
                tracing::info!("Interrupted, stopping expiry sweep");
                handle.abort();
            }
            print_json(&serde_json::json!({ "stopped": true }))?;
        }
    }

    Ok(())
}
