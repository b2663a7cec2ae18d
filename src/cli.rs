//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manview manual viewer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root; config and library paths are relative to it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: manview.toml)
    #[arg(short = 'C', long, default_value = "manview.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the section outline of a manual
    Outline {
        /// HTML file path or http(s) URL
        source: String,

        /// Print the parsed document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a manual, listing matching sections and subsections
    Search {
        /// HTML file path or http(s) URL
        source: String,

        /// Query text; every word must occur in a match
        query: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Write the document with matches highlighted to this file
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Write the processed document (contents list removed, heading ids assigned)
    Render {
        /// HTML file path or http(s) URL
        source: String,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the library over HTTP. Re-parse documents on change automatically
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "manview", "-r", "fleet", "search", "ops.html", "red light", "--json",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("fleet")));
        assert_eq!(cli.config, PathBuf::from("manview.toml"));
        match cli.command {
            Commands::Search {
                source,
                query,
                json,
                html,
            } => {
                assert_eq!(source, "ops.html");
                assert_eq!(query, "red light");
                assert!(json);
                assert!(html.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_watch_flag() {
        let cli = Cli::try_parse_from(["manview", "serve", "-p", "8000", "-w"]).unwrap();
        assert!(cli.is_serve());
        match cli.command {
            Commands::Serve { port, watch, interface } => {
                assert_eq!(port, Some(8000));
                assert_eq!(watch, Some(true));
                assert!(interface.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["manview", "serve", "-w", "false"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { watch: Some(false), .. }));
    }
}
