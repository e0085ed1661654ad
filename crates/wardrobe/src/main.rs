//! Wardrobe CLI - garment photo analysis with vision-language models.
//!
//! Removes the background of garment photos, asks a vision model to classify
//! them, and emits validated semantic records as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Register an LLM endpoint
//! wardrobe endpoints add llm --base https://api.example.com --key sk-... --model qwen-vl-plus
//!
//! # Analyze photos
//! wardrobe analyze shirt.jpg jeans.png --format jsonl --output wardrobe.jsonl
//!
//! # Use the remote background removal service for this run
//! REMOVEBG_TYPE=removebg wardrobe analyze shirt.jpg
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Wardrobe - garment photo analysis with vision-language models.
#[derive(Parser, Debug)]
#[command(name = "wardrobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze garment photos into semantic records
    Analyze(cli::analyze::AnalyzeArgs),

    /// Manage configured LLM and background-removal endpoints
    Endpoints(cli::endpoints::EndpointsArgs),

    /// Download the segmentation model or list LLM endpoint models
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is not up yet, so config problems go straight to stderr.
    let config = match wardrobe_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `wardrobe config path`."
            );
            wardrobe_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Wardrobe v{}", wardrobe_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, &config).await,
        Commands::Endpoints(args) => cli::endpoints::execute(args, &config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
