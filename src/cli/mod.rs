//! CLI module for swarmctl
//!
//! Subcommands:
//! - `swarmctl create` - Declare a replicated service
//! - `swarmctl list` - List services (declared or observed state)
//! - `swarmctl delete` - Delete services by name
//! - `swarmctl network` - Ensure or remove an overlay network
//! - `swarmctl serve` - Run the HTTP API
//! - `swarmctl config` - Show or initialise the config file

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "swarmctl")]
#[command(about = "Declare and reconcile replicated services on a Docker Swarm cluster")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.swarmctl/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a .env file loaded before the config
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// Engine endpoint, overrides the config file and environment
    #[arg(long, value_name = "URL", global = true)]
    pub platform_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Declare a replicated service
    Create(CreateArgs),

    /// List services
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Delete services by name
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Manage overlay networks
    Network(NetworkArgs),

    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Show or initialise the config file
    Config(ConfigArgs),
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Service name
    #[arg(long)]
    pub name: String,

    /// Container image
    #[arg(long)]
    pub image: String,

    /// Desired replica count
    #[arg(long, default_value = "1")]
    pub replicas: u64,

    /// Memory limit in MB (0 = unlimited)
    #[arg(long = "memory", value_name = "MB", default_value = "0")]
    pub memory_limit: u64,

    /// Overlay network to attach (default: from config)
    #[arg(long)]
    pub network: Option<String>,

    /// Fail when the network cannot be provisioned
    #[arg(long)]
    pub strict_networking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show running vs. required replicas instead of the declared view
    #[arg(long)]
    pub states: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Service names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Attempt every removal and report all failures
    #[arg(long)]
    pub best_effort: bool,
}

/// Arguments for the network command
#[derive(Parser, Debug)]
pub struct NetworkArgs {
    #[command(subcommand)]
    pub action: NetworkAction,
}

#[derive(Subcommand, Debug)]
pub enum NetworkAction {
    /// Create the overlay network if it does not exist
    Ensure {
        /// Network name
        name: String,
    },

    /// Remove the network if it exists
    Remove {
        /// Network name
        name: String,
    },
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Bind address (default: from config)
    #[arg(long)]
    pub bind_addr: Option<String>,

    /// Port to listen on (default: from config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
