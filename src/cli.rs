use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stackrig", version, about = "Local stack lifecycle orchestrator")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Use a specific config file
    #[arg(short = 'f', long = "file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Print outcomes as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start units by port (all units if empty)
    Start {
        ports: Vec<u16>,
    },
    /// Stop units by port (all units if empty)
    Stop {
        ports: Vec<u16>,
    },
    /// Probe units by port (all units if empty)
    Health {
        ports: Vec<u16>,
    },
    /// Ask a running server to reload its configuration
    Refresh {
        port: u16,
    },
    /// Show a live status overview of every unit
    Status,
    /// Blockchain network lifecycle
    Blockchain {
        #[command(subcommand)]
        command: LifecycleCommands,
    },
    /// Database lifecycle
    Database {
        #[command(subcommand)]
        command: LifecycleCommands,
    },
    /// Create wallets, keys, and DID documents
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },
    /// Check the config and unit registry without touching anything
    Validate,
    /// Generate a starter stackrig.toml
    Init,
}

#[derive(Debug, Subcommand)]
pub enum LifecycleCommands {
    Start,
    Stop,
    Status,
}

#[derive(Debug, Subcommand)]
pub enum CreateCommands {
    /// Create a wallet file
    Wallet {
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Create the four keypairs for an existing wallet
    Keys {
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Create a DID document from an existing wallet
    Diddoc {
        name: String,
        did: String,
        controller: String,
        #[arg(long)]
        password: String,
    },
}
