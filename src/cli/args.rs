//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const QUICK_START: &str = "Quick Start:
  $ docrag init                          # Create .docrag/settings.toml
  $ docrag ingest notes.md handbook.txt  # Chunk, embed, and index files
  $ docrag query \"where did the cat sit\"  # Show the closest chunks
  $ docrag query \"...\" --answer          # Also generate an answer
  $ docrag serve                         # Start the HTTP API";

/// Document retrieval service
#[derive(Parser, Debug)]
#[command(
    name = "docrag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Chunk, embed, and search documents",
    long_about = "Index text documents as embedded chunks and retrieve the most similar ones for a question.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = QUICK_START
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .docrag directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Ingest documents into the index
    #[command(
        about = "Chunk, embed, and index text files",
        after_help = "Examples:\n  docrag ingest README.md\n  docrag ingest docs/*.md\n  docrag ingest draft.txt --id proposal-v2"
    )]
    Ingest {
        /// Files to ingest (UTF-8 text)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Document id to use instead of the file name (single file only)
        #[arg(long)]
        id: Option<String>,
    },

    /// Query the index
    #[command(about = "Retrieve the chunks most similar to a question")]
    Query {
        /// The question to search for
        question: String,

        /// Number of chunks to return (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,

        /// Generate an answer from the retrieved chunks
        #[arg(long)]
        answer: bool,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    #[command(
        about = "Serve the HTTP API",
        after_help = "Examples:\n  docrag serve\n  docrag serve --bind 0.0.0.0:8000"
    )]
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show index status
    #[command(about = "Show snapshot location, entry count, and model")]
    Status {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .docrag/settings.toml")]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_args() {
        let cli = Cli::try_parse_from(["docrag", "query", "where is it", "-k", "5", "--json"]).unwrap();
        match cli.command {
            Commands::Query {
                question,
                k,
                answer,
                json,
            } => {
                assert_eq!(question, "where is it");
                assert_eq!(k, Some(5));
                assert!(!answer);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["docrag", "ingest"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["docrag", "status", "-c", "custom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
