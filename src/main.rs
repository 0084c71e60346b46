use std::path::PathBuf;

use clap::{Parser, Subcommand};

use feed_snapshot::services::annotation_source;
use feed_snapshot::{App, Config, Result};

#[derive(Debug, Parser)]
#[command(name = "feed-snapshot", version, about = "Ingest feeds and export a JSON snapshot")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch all feeds, store new items and export the snapshot
    Run,
    /// Re-export the snapshot from the store
    Export,
    /// Attach annotations from the configured source and re-export
    Annotate {
        /// Item id to annotate (defaults to the newest item)
        #[arg(long)]
        item: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading config so OPENAI_API_KEY can come from it
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let app = App::new(&config).await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let feeds = config.feed_urls()?;
            let report = app.run(&feeds).await?;
            println!(
                "Ingested {} new items from {}/{} feeds; exported {}",
                report.items_inserted,
                report.feeds_ok,
                feeds.len(),
                report.items_exported
            );
        }
        Command::Export => {
            let exported = app.export_snapshot().await?;
            println!("Exported {} items", exported);
        }
        Command::Annotate { item } => {
            let source = annotation_source(&config.annotations)?;
            let report = app.annotate(source.as_ref(), item.as_deref()).await?;
            match report.item_id {
                Some(id) => println!(
                    "Attached {} annotations to {}; exported {}",
                    report.annotations_inserted, id, report.items_exported
                ),
                None => println!("No items stored yet; run ingestion first"),
            }
        }
    }

    Ok(())
}
