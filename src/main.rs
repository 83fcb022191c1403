//! Media indexer command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_indexer::scanner::LoftyExtractor;
use media_indexer::tracklist::InMemoryTrackList;
use media_indexer::{IndexerConfig, IndexerEvent, IndexerState, MediaIndexer};

/// Index audio files and their cover art.
#[derive(Parser)]
#[command(name = "media-indexer")]
#[command(about = "Scan music folders and build a track list")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan folders and print the resulting track list (default)
    Scan {
        /// Folders to index (defaults to MEDIA_INDEXER_FOLDER or the music directory)
        folders: Vec<PathBuf>,

        /// Audio file extension to index, may be repeated (default: mp3)
        #[arg(short, long = "extension")]
        extensions: Vec<String>,

        /// Print indexer events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the folders indexed when none are given
    Folders,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_indexer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Commands::Scan {
        folders: Vec::new(),
        extensions: Vec::new(),
        json: false,
    }) {
        Commands::Folders => {
            for folder in IndexerConfig::from_env().initial_folders {
                println!("{}", folder.display());
            }
        }
        Commands::Scan {
            folders,
            extensions,
            json,
        } => {
            let mut config = if folders.is_empty() {
                IndexerConfig::from_env()
            } else {
                IndexerConfig::with_folders(folders)
            };
            if !extensions.is_empty() {
                config = config.extensions(extensions);
            }
            if config.initial_folders.is_empty() {
                eprintln!("No media folders to index");
                std::process::exit(1);
            }

            match scan(config, json).await {
                Ok(IndexerState::Error) => std::process::exit(1),
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Failed to start the indexer: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Run the indexer until its queue drains and print the track list.
async fn scan(
    config: IndexerConfig,
    json: bool,
) -> Result<IndexerState, media_indexer::IndexerError> {
    let sink = Arc::new(InMemoryTrackList::new());
    let (indexer, mut rx) = MediaIndexer::new(config, Arc::new(LoftyExtractor), sink.clone())?;
    indexer.initialize();

    let mut drained = false;
    let state = loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if json {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{}", line),
                            Err(e) => tracing::error!("Failed to encode event: {}", e),
                        }
                    }
                    match event {
                        IndexerEvent::ProgressChanged { progress } => {
                            tracing::debug!("Progress: {:.0}%", progress * 100.0);
                        }
                        IndexerEvent::IndexingDone => drained = true,
                        IndexerEvent::StateChanged { state }
                            if drained && state != IndexerState::Active =>
                        {
                            break state;
                        }
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} indexer events", skipped);
                }
                Err(RecvError::Closed) => break indexer.state(),
            },
            _ = tokio::signal::ctrl_c(), if !indexer.is_shutting_down() => {
                indexer.shutdown();
            }
        }
    };

    if !json {
        for uri in sink.tracks() {
            println!("{}", uri);
        }
    }
    tracing::info!("Indexed {} tracks, final state {:?}", sink.tracks().len(), state);

    Ok(state)
}
