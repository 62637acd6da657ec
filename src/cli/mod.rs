//! CLI module for the finance tutor.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Finance tutor - grounded answers to finance questions
///
/// Answers questions from a finance knowledge base with citations and
/// related videos, at the level of detail you choose.
#[derive(Parser, Debug)]
#[command(name = "fintutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a question and get a cited answer
    Ask {
        /// The question to ask
        question: String,

        /// Explanation depth: simple, regular or in-depth
        #[arg(short, long, default_value = "regular")]
        detail: String,

        /// Print the answer as it is generated, followed by related videos
        #[arg(short, long)]
        stream: bool,
    },

    /// Generate a knowledge-check question for a topic
    Quiz {
        /// Finance topic to quiz on
        topic: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (API keys are masked)
    Show,

    /// Show configuration file path
    Path,
}
