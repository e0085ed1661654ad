//! The `wardrobe endpoints` command for endpoint administration.

use clap::{Args, Subcommand};
use wardrobe_core::{Capability, Config, EndpointConfig, NewEndpoint};

use super::open_store;

/// Arguments for the `endpoints` command.
#[derive(Args, Debug)]
pub struct EndpointsArgs {
    #[command(subcommand)]
    pub command: EndpointsCommand,
}

/// Subcommands for endpoint administration.
#[derive(Subcommand, Debug)]
pub enum EndpointsCommand {
    /// List configured endpoints with their usage counts
    List {
        /// Include soft-deleted endpoints
        #[arg(long)]
        all: bool,

        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Register a new endpoint
    Add {
        /// Capability the endpoint provides (llm or removebg)
        capability: Capability,

        /// Base URL of the service
        #[arg(long)]
        base: String,

        /// API key sent with each request
        #[arg(long, env = "WARDROBE_API_KEY", hide_env_values = true)]
        key: String,

        /// Model name (LLM endpoints)
        #[arg(long)]
        model: Option<String>,
    },

    /// Soft-delete an endpoint so it is no longer selected
    Remove {
        /// Endpoint id as shown by `endpoints list`
        id: i64,
    },
}

/// Execute the endpoints command.
pub async fn execute(args: EndpointsArgs, config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;

    match args.command {
        EndpointsCommand::List { all, json } => {
            let endpoints: Vec<EndpointConfig> = store
                .list_all()
                .await?
                .into_iter()
                .filter(|e| all || !e.deleted)
                .collect();

            if json {
                let redacted: Vec<EndpointConfig> = endpoints.into_iter().map(redact).collect();
                println!("{}", serde_json::to_string_pretty(&redacted)?);
            } else if endpoints.is_empty() {
                println!("No endpoints configured. Add one with `wardrobe endpoints add`.");
            } else {
                println!(
                    "{:<5} {:<9} {:<45} {:<20} {:>6}",
                    "ID", "TYPE", "BASE", "MODEL", "USAGE"
                );
                for e in &endpoints {
                    println!("{}", format_row(e));
                }
            }
        }

        EndpointsCommand::Add {
            capability,
            base,
            key,
            model,
        } => {
            if base.trim().is_empty() {
                anyhow::bail!("--base must not be empty");
            }
            let id = store
                .insert(NewEndpoint {
                    capability,
                    api_base: base.trim().to_string(),
                    api_key: key.trim().to_string(),
                    model: model.filter(|m| !m.trim().is_empty()),
                })
                .await?;
            tracing::info!("Registered {capability} endpoint #{id}");
            println!("Added {capability} endpoint #{id}");
        }

        EndpointsCommand::Remove { id } => {
            if store.soft_delete(id).await? {
                println!("Removed endpoint #{id}");
            } else {
                anyhow::bail!("No active endpoint with id {id}");
            }
        }
    }

    Ok(())
}

fn format_row(e: &EndpointConfig) -> String {
    let mut row = format!(
        "{:<5} {:<9} {:<45} {:<20} {:>6}",
        e.id,
        e.capability,
        e.api_base,
        e.model.as_deref().unwrap_or("-"),
        e.usage_count
    );
    if e.deleted {
        row.push_str("  (deleted)");
    }
    if !e.has_credential() {
        row.push_str("  (no key)");
    }
    row
}

/// Hide all but the last four characters of the API key.
fn redact(mut endpoint: EndpointConfig) -> EndpointConfig {
    let chars: Vec<char> = endpoint.api_key.chars().collect();
    endpoint.api_key = if chars.len() > 4 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    } else {
        "****".to_string()
    };
    endpoint
}
