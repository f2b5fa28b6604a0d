//! w24fs Server Binary
//!
//! Starts the TCP server for w24fs.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use w24fs::network::Server;
use w24fs::{Config, Engine};

/// w24fs Server
#[derive(Parser, Debug)]
#[command(name = "w24fs-server")]
#[command(about = "Remote file-query and archive retrieval server")]
#[command(version)]
struct Args {
    /// Search root (defaults to $HOME)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Artifact directory (defaults to <base-dir>/w24project)
    #[arg(short, long)]
    artifact_dir: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8086")]
    listen: String,

    /// Maximum concurrent sessions
    #[arg(short, long, default_value = "15")]
    max_connections: usize,

    /// Transfer chunk size in bytes
    #[arg(short, long, default_value = "1024")]
    chunk_size: usize,

    /// Deepest directory level visited
    #[arg(long, default_value = "256")]
    max_depth: usize,

    /// Act as coordinator: send a hand-off port line on every connection
    #[arg(long)]
    handshake: bool,

    /// Mirror port sharing the hand-off rotation (repeatable)
    #[arg(long = "redirect", value_name = "PORT")]
    redirect_ports: Vec<u16>,

    /// Keep archive artifacts after sending them
    #[arg(long)]
    keep_artifacts: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,w24fs=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    // Build config from args
    let mut builder = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .chunk_size(args.chunk_size)
        .max_depth(args.max_depth)
        .handshake(args.handshake)
        .redirect_ports(args.redirect_ports)
        .keep_artifacts(args.keep_artifacts);
    if let Some(base_dir) = args.base_dir {
        builder = builder.base_dir(base_dir);
    }
    if let Some(artifact_dir) = args.artifact_dir {
        builder = builder.artifact_dir(artifact_dir);
    }
    let config = builder.build();

    tracing::info!("w24fs Server v{}", w24fs::VERSION);
    tracing::info!("Search root: {}", config.base_dir.display());
    tracing::info!("Artifacts: {}", config.artifact_dir.display());

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler
    let shutdown_flag = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown_flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!("Cannot install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
