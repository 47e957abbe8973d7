//! CLI interface for halalapi.

pub mod handlers;
pub mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::init::AppContext;
use output::OutputMode;

/// halalapi - Classify food ingredients as halal, haram or doubtful
#[derive(Parser)]
#[command(name = "halalapi", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./halalapi.toml when present)
    #[arg(long, short, env = "HALALAPI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Listen address (overrides config)
        #[arg(long, env = "HALALAPI_LISTEN_ADDR")]
        listen: Option<String>,
        /// Load assets on first request instead of at startup
        #[arg(long)]
        no_preload: bool,
    },

    /// Classify ingredients once and print the result
    Predict {
        /// Ingredients, one per argument (quote multi-word ingredients)
        #[arg(required = true)]
        ingredients: Vec<String>,
    },

    /// Resolve (and download, for remote sources) the model and vocabulary
    Fetch,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Execute a parsed command.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let mode = OutputMode::from_json_flag(cli.json);

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "halalapi", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { listen, no_preload } => {
            if let Some(addr) = listen {
                config.server.listen_addr = addr;
            }
            let ctx = AppContext::new(config)?;
            handlers::serve::handle_serve(&ctx, !no_preload).await?
        }
        Commands::Predict { ingredients } => {
            let ctx = AppContext::new(config)?;
            handlers::predict::handle_predict(&ctx, ingredients, mode).await?
        }
        Commands::Fetch => {
            let ctx = AppContext::new(config)?;
            handlers::assets::handle_fetch(&ctx, mode).await?
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
