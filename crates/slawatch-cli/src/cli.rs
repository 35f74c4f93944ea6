//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use slawatch_core::SourceSystem;

/// SLA overdue classification and reporting over ticket exports
#[derive(Debug, Parser)]
#[command(name = "slawatch")]
#[command(about = "SLA overdue classification and reporting over ticket exports", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (defaults to the first config.yaml on the search path)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reference time for every computation (RFC 3339); defaults to now
    #[arg(long, global = true, value_name = "TIME")]
    pub now: Option<String>,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every ticket in a batch
    Classify {
        /// Ticket batch (JSON array or JSON Lines)
        file: PathBuf,

        /// Only list overdue tickets
        #[arg(long)]
        overdue_only: bool,
    },

    /// Workload, breakdowns and team performance for a batch
    Analyze {
        /// Ticket batch (JSON array or JSON Lines)
        file: PathBuf,
    },

    /// Client analytics across one or more batches
    Clients {
        /// Ticket batches, typically one per source
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Number of leading clients to list (defaults to reporting.top_clients_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Overdue alert digests, one per source
    Alerts {
        /// Ticket batch (JSON array or JSON Lines)
        file: PathBuf,

        /// Restrict the digest to one source
        #[arg(long, value_parser = parse_source)]
        source: Option<SourceSystem>,
    },

    /// Effective threshold tables
    Thresholds {
        /// Show only the catalog used by this source
        #[arg(long, value_parser = parse_source)]
        source: Option<SourceSystem>,
    },
}

fn parse_source(raw: &str) -> Result<SourceSystem, String> {
    raw.parse::<SourceSystem>().map_err(|err| err.to_string())
}
