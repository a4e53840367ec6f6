//! Binary crate for the `weather-server` relay.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive credential configuration
//! - The HTTP surface: relay routes, CORS, static frontend fallback

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

mod assets;
mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenv::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cmd = cli::Cli::parse();
    cmd.run().await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).try_init() {
        // No subscriber is installed at this point, so tracing macros would go nowhere.
        eprintln!("tracing init failed: {e}");
    }
}
