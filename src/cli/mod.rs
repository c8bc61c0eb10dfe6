//! CLI module for Hark.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::chain::Task;
use clap::{Parser, Subcommand};

/// Hark - Podcast Transcript Assistant
///
/// Ask questions about podcast transcripts and get answers grounded in what
/// was actually said.
#[derive(Parser, Debug)]
#[command(name = "hark")]
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
    /// Ask a question and get an answer from the transcripts
    Ask {
        /// The question to ask
        question: String,

        /// What to do with the retrieved transcripts (summary, retrieve)
        #[arg(short, long)]
        task: Option<Task>,

        /// Number of transcript chunks to retrieve
        #[arg(short, long)]
        limit: Option<usize>,

        /// Weight toward vector similarity (0.0-1.0)
        #[arg(short, long)]
        alpha: Option<f32>,
    },

    /// Search for transcript chunks without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Weight toward vector similarity (0.0-1.0)
        #[arg(short, long)]
        alpha: Option<f32>,
    },

    /// Start an interactive chat session
    Chat,

    /// Download transcripts from the podcast site
    Scrape {
        /// First listing page
        #[arg(long)]
        first_page: Option<u32>,

        /// Last listing page (inclusive)
        #[arg(long)]
        last_page: Option<u32>,

        /// Directory to write transcripts to
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check configuration and connectivity
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["hark", "-vv", "ask", "what about soil?", "--task", "retrieve"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, task, limit, alpha } => {
                assert_eq!(question, "what about soil?");
                assert_eq!(task, Some(Task::Retrieve));
                assert!(limit.is_none());
                assert!(alpha.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_task() {
        assert!(Cli::try_parse_from(["hark", "ask", "q", "--task", "translate"]).is_err());
    }
}
