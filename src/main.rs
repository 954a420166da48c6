//! Sincetail - file tailing engine with durable offset checkpoints.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sincetail::config::ConfigLoader;
use sincetail::decode::PlainDecoder;
use sincetail::engine::Engine;
use sincetail::sink::ChannelSink;

#[derive(Parser)]
#[command(
    name = "sincetail",
    about = "File tailing engine with durable offset checkpoints",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the configured files, printing decoded events as JSON lines.
    Run {
        /// Config file path (defaults to the search paths).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config } => {
            if let Err(e) = run(config).await {
                tracing::error!(error = %e, "Fatal error");
                std::process::exit(1);
            }
        }
    }
}

async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let loader = match config_path {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;

    tracing::info!(
        paths = config.path.len(),
        start_position = ?config.start_position,
        "Starting sincetail"
    );

    let (sink, mut events) = ChannelSink::channel();
    let handle = Engine::new(config, Arc::new(PlainDecoder), Arc::new(sink)).start()?;

    // Drain decoded events to stdout until shutdown.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    handle.shutdown().await;
    printer.abort();

    Ok(())
}
