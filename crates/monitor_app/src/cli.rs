use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Watches a members-only listing page and reports new entries.
#[derive(Debug, Parser)]
#[command(name = "monitor_app", version, about)]
pub struct Cli {
    /// RON configuration file (default: ./monitor.ron if present)
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check at the configured daily times until Ctrl-C
    Watch,
    /// Run one check now and print the result
    Check,
    /// Run a check if the event text contains the trigger phrase
    Event {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Parse a saved listing page offline and print what was found
    Parse { file: PathBuf },
}
