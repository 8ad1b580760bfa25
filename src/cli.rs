// Command-line interface definitions for clipsift
//
// This module is separate so the binary stays a thin dispatcher over the
// library crate.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clipsift")]
#[command(author, version, about = "AI-powered clipboard capture and analysis")]
#[command(long_about = "
Clipsift captures text, analyzes it with a configurable AI backend
(OpenAI, Gemini, or a local heuristic mock), and keeps a browsable
history of structured results: topic, entities, intent, categories,
and action items.

USAGE:
  clipsift add \"Buy milk and eggs\"     analyze a snippet
  echo text | clipsift add              analyze stdin
  clipsift list                         browse the history
  clipsift retry <id>                   re-run a failed analysis
  clipsift export --format txt          export the history
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the analysis provider (openai, gemini, mock)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture text and analyze it
    Add {
        /// Text to capture; read from stdin when omitted
        text: Option<String>,

        /// Capture without analyzing (item stays pending)
        #[arg(long)]
        no_process: bool,
    },

    /// List history items (default if no command specified)
    List {
        /// Filter by status: pending, processing, processed, failed
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,
    },

    /// Show one item in full
    Show {
        /// Item id
        id: String,
    },

    /// Re-run analysis for an item
    Retry {
        /// Item id
        id: String,
    },

    /// Remove one item from the history
    Remove {
        /// Item id
        id: String,
    },

    /// Remove all items from the history
    Clear,

    /// Show processing statistics
    Stats,

    /// Export the history to a file
    Export {
        /// Output format: txt, json, or csv
        #[arg(long, default_value = "txt", value_name = "FORMAT")]
        format: String,

        /// Output file (defaults to a timestamped name in the
        /// current directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<std::path::PathBuf>,
    },

    /// Manage the subscription
    Subscription {
        #[command(subcommand)]
        action: SubscriptionAction,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Show tier, quota, and expiry
    Status,
    /// Upgrade to premium (simulated billing)
    Purchase,
    /// Cancel the premium subscription
    Cancel,
    /// Restore a previous purchase
    Restore,
}
