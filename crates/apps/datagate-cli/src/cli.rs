//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use datagate_types::DEFAULT_PAGE_SIZE;

use crate::output::OutputFormat;

/// Datagate operator CLI.
#[derive(Parser, Debug)]
#[command(name = "datagate")]
#[command(author = "Datagate Contributors")]
#[command(version)]
#[command(about = "Inspect Datagate access requests and pending grants")]
#[command(
    long_about = "Datagate reconciles dataset access requests with on-ledger payments.\n\nThis tool reads the escrow database; run 'datagate init' to create one."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "DATAGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output format argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file and create the escrow database.
    ///
    /// Safe to run again: an existing config file is left untouched.
    Init,

    /// List access requests for one owner or one requester.
    ///
    /// Newest first. Pass the printed cursor back with --cursor for the
    /// next page.
    List {
        /// Dataset owner whose incoming requests to list.
        #[arg(long, conflicts_with = "requester", required_unless_present = "requester")]
        owner: Option<String>,

        /// Requester whose outgoing requests to list.
        #[arg(long)]
        requester: Option<String>,

        /// Maximum results to show.
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,

        /// Continue after this cursor.
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Show the latest request for an (owner, requester, dataset) tuple.
    Show {
        /// Dataset owner address.
        owner: String,
        /// Requester address.
        requester: String,
        /// Dataset identifier.
        dataset: String,
    },

    /// Inspect grant obligations.
    Grants {
        #[command(subcommand)]
        command: GrantsCommand,
    },
}

/// `grants` subcommands.
#[derive(Subcommand, Debug)]
pub enum GrantsCommand {
    /// Grants owed for paid requests that the ledger has not recorded yet.
    Pending {
        /// Maximum results to show.
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },

    /// Grants the ledger rejected outright; these are no longer retried.
    Failed {
        /// Maximum results to show.
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
}
