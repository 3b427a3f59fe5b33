//! Command-line interface definitions for Daily Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Each subcommand is a partial invocation of the pipeline; `run` is the
//! full sequence.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Daily Digest application.
///
/// # Examples
///
/// ```sh
/// # Full pipeline
/// daily_digest run
///
/// # Full pipeline without the remote summarization call
/// daily_digest run --offline
///
/// # Rebuild the site from the existing reports
/// daily_digest build
///
/// # Use an alternate configuration file
/// daily_digest --config staging.yaml fetch
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file (defaults to ./config.yaml)
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Full pipeline: fetch, summarize, build
    Run {
        /// Force the offline formatter instead of the remote call
        #[arg(long)]
        offline: bool,
    },
    /// Fetch and deduplicate articles, then write today's snapshot
    Fetch,
    /// Summarize today's snapshot into the Markdown report
    Summarize {
        /// Force the offline formatter instead of the remote call
        #[arg(long)]
        offline: bool,
    },
    /// Build the static site from the existing reports
    Build,
    /// Probe the summarization endpoint with a trivial request
    Test,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_with_offline() {
        let cli = Cli::parse_from(["daily_digest", "run", "--offline"]);
        assert!(matches!(cli.command, Command::Run { offline: true }));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_subcommands() {
        assert!(matches!(
            Cli::parse_from(["daily_digest", "fetch"]).command,
            Command::Fetch
        ));
        assert!(matches!(
            Cli::parse_from(["daily_digest", "build"]).command,
            Command::Build
        ));
        assert!(matches!(
            Cli::parse_from(["daily_digest", "test"]).command,
            Command::Test
        ));
        assert!(matches!(
            Cli::parse_from(["daily_digest", "summarize"]).command,
            Command::Summarize { offline: false }
        ));
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["daily_digest", "--config", "staging.yaml", "run"]);
        assert_eq!(cli.config.as_deref(), Some("staging.yaml"));
    }
}
