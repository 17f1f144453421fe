//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::api::CallStatus;

/// voicecrm - Operator console for the voice-assistant CRM
#[derive(Parser, Debug)]
#[command(name = "voicecrm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse, inspect and retry logged calls
    #[command(subcommand)]
    Calls(CallsCommand),

    /// Browse customers
    #[command(subcommand)]
    Customers(CustomersCommand),

    /// Download a CSV export
    Export {
        /// What to export
        #[arg(value_enum)]
        kind: ExportTarget,

        /// Call filters (ignored for customer exports)
        #[command(flatten)]
        filters: CallFilterArgs,

        /// Output file path (defaults to a timestamped file in general.export_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show call metrics for a date window
    Metrics {
        /// Start date (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },

    /// Show dashboard counters
    Stats,

    /// Launch the interactive TUI
    Tui,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CallsCommand {
    /// List calls matching the given filters
    List {
        #[command(flatten)]
        filters: CallFilterArgs,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Calls per page (max 100)
        #[arg(long)]
        per_page: Option<u32>,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the detail view of a call
    View {
        /// Call ID
        call_id: String,

        /// Print the raw record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retry a failed call
    Retry {
        /// Call ID
        call_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CustomersCommand {
    /// List customers
    List {
        /// Search by name, phone or email
        #[arg(short, long)]
        search: Option<String>,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Customers per page (max 100)
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Show a customer's call history
    Calls {
        /// Customer ID (as shown by `customers list`)
        customer_id: i64,

        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },
}

/// Filters shared by `calls list` and `export calls`
#[derive(Args, Debug, Clone, Default)]
pub struct CallFilterArgs {
    /// Only calls with this status (initiated, connected, completed, failed)
    #[arg(long)]
    pub status: Option<CallStatus>,

    /// Relative window: 24h, 7d, 30d or all
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub range: Option<String>,

    /// Custom range start (YYYY-MM-DD), requires --to
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Custom range end (YYYY-MM-DD), requires --from
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Customer name or phone number
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportTarget {
    Calls,
    Customers,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
