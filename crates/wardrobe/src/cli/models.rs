//! The `wardrobe models` command.

use std::sync::Arc;

use clap::{Args, Subcommand};
use wardrobe_core::background::download_model;
use wardrobe_core::llm::HttpTransport;
use wardrobe_core::{Config, EndpointSelector, VisionClient, VisionOptions};

use super::open_store;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the local background segmentation model
    Download {
        /// Re-download even if the model is already installed
        #[arg(long)]
        force: bool,
    },

    /// Show where the segmentation model is stored
    Path,

    /// List models offered by the least-used LLM endpoint
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download { force } => {
            let dest = config.segmentation_model_path();
            if dest.exists() && !force {
                println!("Segmentation model already installed at {}", dest.display());
                return Ok(());
            }

            let url = &config.background.model_url;
            tracing::info!("Downloading {} from {url}", config.background.model);
            let client = reqwest::Client::new();
            let digest = download_model(
                &client,
                url,
                &dest,
                config.background.model_blake3.as_deref(),
            )
            .await?;

            if config.background.model_blake3.is_none() {
                tracing::info!("No checksum pinned; BLAKE3 of the download is {digest}");
            }
            println!("Segmentation model installed at {}", dest.display());
        }

        ModelsCommand::Path => {
            println!("{}", config.segmentation_model_path().display());
        }

        ModelsCommand::List { json } => {
            let store = open_store(config)?;
            let client = VisionClient::new(
                EndpointSelector::new(Arc::new(store)),
                Arc::new(HttpTransport::new()),
                VisionOptions::from(&config.vision),
            );

            let models = client.list_models().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else if models.is_empty() {
                println!("No models reported (is an API key configured for the LLM endpoint?)");
            } else {
                for model in &models {
                    if model.name == model.id {
                        println!("{}", model.id);
                    } else {
                        println!("{}  ({})", model.id, model.name);
                    }
                }
            }
        }
    }

    Ok(())
}
