//! Command-line argument parsing for ragdesk
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragdesk - ask questions about your local documents with a local model
#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(version)]
#[command(about = "Local document search and question answering over Ollama", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (info), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the backend HTTP service
    Serve {
        /// Override the listening port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a question from the stored documents
    Ask {
        /// The question
        query: String,

        /// Passages to retrieve (default 3)
        #[arg(short, long, default_value_t = 0)]
        limit: i64,

        /// Also print the retrieved passages
        #[arg(long)]
        show_context: bool,
    },

    /// Search the vector store without generating an answer
    Search {
        query: String,

        /// Maximum results (default 5)
        #[arg(short, long, default_value_t = 0)]
        limit: i64,
    },

    /// List available Ollama models
    Models,

    /// Run system diagnostics and health checks
    Doctor,

    /// Display the effective configuration
    Config {
        /// Write it to the default config path
        #[arg(long)]
        save: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        match self.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        }
    }
}

impl Verbosity {
    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn filter(&self) -> &'static str {
        match self {
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["ragdesk", "models"]);
        assert_eq!(args.verbosity(), Verbosity::Normal);
        assert_eq!(args.verbosity().filter(), "info");

        let args = Args::parse_from(["ragdesk", "-v", "models"]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);

        let args = Args::parse_from(["ragdesk", "models", "-vv"]);
        assert_eq!(args.verbosity().filter(), "trace");
    }

    #[test]
    fn test_ask_arguments() {
        let args = Args::parse_from(["ragdesk", "ask", "what is ownership?", "--limit", "4"]);
        match args.command {
            Commands::Ask {
                query,
                limit,
                show_context,
            } => {
                assert_eq!(query, "what is ownership?");
                assert_eq!(limit, 4);
                assert!(!show_context);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let args = Args::parse_from(["ragdesk", "serve", "--config", "/tmp/ragdesk.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/ragdesk.toml")));
        assert!(matches!(args.command, Commands::Serve { port: None }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["ragdesk"]).is_err());
    }
}
