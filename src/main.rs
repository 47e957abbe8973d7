//! halalapi - Ingredient classification service
//!
//! Usage:
//!   halalapi serve                       Start the HTTP service
//!   halalapi predict gelatin "cane sugar" Classify ingredients from the shell
//!   halalapi fetch                       Download and verify the assets
//!   halalapi --help                      Show all commands

use anyhow::Result;
use clap::Parser;

use halalapi::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr keeps stdout clean for --json output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("halalapi=info".parse()?),
        )
        .init();

    halalapi::cli::execute(cli).await
}
