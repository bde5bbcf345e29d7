//! CLI module
//!
//! This module provides the command-line interface for the resource-tree tool:
//! running the server and querying a running server the way a host view would.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;

use crate::{
    api::{serve, Client, ClientConfig, ServerConfig},
    models::{DisplayItem, Node},
    provider::{ProviderConfig, TreeDataProvider},
    sample::sample_tree,
    tree::TreeStore,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API server URL
    #[arg(short, long, env = "RESOURCE_TREE_SERVER", default_value = "http://localhost:3000")]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the resource-tree API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// JSON tree definition to serve instead of the built-in sample
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Simulated latency of resolve calls, in milliseconds
        #[arg(long, default_value_t = 800)]
        resolve_delay_ms: u64,
    },

    /// List the children of a node (the root when no id is given)
    Children {
        /// Node id
        id: Option<String>,
    },

    /// Show the parent of a node
    Parent {
        /// Node id
        id: String,
    },

    /// Show the display item for a node
    Item {
        /// Node id
        id: String,
    },

    /// Resolve a node and show its detailed display item
    Resolve {
        /// Node id
        id: String,
    },

    /// Refresh a node, or the whole tree when no id is given
    Refresh {
        /// Node id
        id: Option<String>,
    },

    /// Print the whole tree with each node's display item
    Tree,

    /// Print the built-in sample tree as JSON
    Sample,

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run the CLI application
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            port,
            tree,
            resolve_delay_ms,
        } => {
            let store = match tree {
                Some(path) => {
                    println!("Loading tree from {}...", path.display());
                    TreeStore::from_json_file(path)?
                }
                None => sample_tree(),
            };

            let provider_config = ProviderConfig {
                resolve_delay: Duration::from_millis(*resolve_delay_ms),
                ..ProviderConfig::default()
            };
            let provider = TreeDataProvider::with_defaults(store, &provider_config)?;

            let config = ServerConfig {
                address: ([127, 0, 0, 1], *port).into(),
            };

            println!("Starting resource-tree API server on port {}...", port);
            serve(provider, config).await?;
            Ok(())
        }

        Commands::Children { id } => {
            let client = create_client(&cli.server);
            let children = client.get_children(id.as_deref()).await?;

            if children.is_empty() {
                println!("No children.");
            }
            for child in &children {
                println!("{}", format_node(child));
            }
            Ok(())
        }

        Commands::Parent { id } => {
            let client = create_client(&cli.server);
            match client.get_parent(id).await? {
                Some(parent) => println!("{}", format_node(&parent)),
                None => println!("\"{}\" has no parent.", id),
            }
            Ok(())
        }

        Commands::Item { id } => {
            let client = create_client(&cli.server);
            let item = client.get_tree_item(id).await?;
            println!("{}", format_item(&item));
            Ok(())
        }

        Commands::Resolve { id } => {
            let client = create_client(&cli.server);
            let item = client.resolve_tree_item(id).await?;
            println!("{}", format_item(&item));
            Ok(())
        }

        Commands::Refresh { id } => {
            let client = create_client(&cli.server);
            client.refresh(id.as_deref()).await?;
            match id {
                Some(id) => println!("Refreshed \"{}\"", id),
                None => println!("Refreshed the whole tree"),
            }
            Ok(())
        }

        Commands::Tree => {
            let client = create_client(&cli.server);
            let root = client.get_tree().await?;
            print_tree(&client, root.children(), 0).await?;
            Ok(())
        }

        Commands::Sample => {
            let json = serde_json::to_string_pretty(sample_tree().root())?;
            println!("{}", json);
            Ok(())
        }

        Commands::Completions { shell } => {
            // Generate completions for the specified shell
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn create_client(server_url: &str) -> Client {
    let config = ClientConfig {
        base_url: server_url.to_string(),
    };

    Client::with_config(config)
}

fn format_node(node: &Node) -> String {
    let kind = if node.is_internal() {
        format!("{} children", node.children().len())
    } else {
        "leaf".to_string()
    };
    format!("{} ({}, {})", node.id().bold(), node.service(), kind)
}

fn format_item(item: &DisplayItem) -> String {
    let marker = if item.is_expandable() { "▸" } else { " " };
    match &item.description {
        Some(description) => format!("{} {} {}", marker, item.label, description.dimmed()),
        None => format!("{} {}", marker, item.label),
    }
}

/// Prints nodes and their subtrees with two spaces of indentation per level
///
/// Items come from the server so the output matches what a host view shows.
async fn print_tree(
    client: &Client,
    nodes: &[Node],
    depth: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    for node in nodes {
        let item = client.get_tree_item(node.id()).await?;
        println!(
            "{}{} {}",
            "  ".repeat(depth),
            format_item(&item),
            format!("[{}]", node.id()).cyan()
        );
        Box::pin(print_tree(client, node.children(), depth + 1)).await?;
    }
    Ok(())
}
