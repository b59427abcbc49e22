//! Command-line argument parsing for signs
//!
//! This module defines the CLI structure using clap derive macros. Flags
//! that mirror config file keys are collected into [`ConfigOverrides`] and
//! applied on top of the loaded file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::FeedFormat;
use crate::config::ConfigOverrides;

/// Signs - conference schedule backend for signage displays
#[derive(Parser, Debug)]
#[command(
    name = "signs",
    version,
    about = "Fetch, cache and serve a conference schedule for signage displays",
    long_about = "Periodically fetches the conference schedule from an upstream JSON or XML feed,
keeps the last good copy in memory and serves it over HTTP together with sponsor logos
and the display frontend."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh loop and HTTP server
    Serve(ServeArgs),

    /// Fetch and decode the feed once, then print a summary
    Check(CheckArgs),

    /// Write a commented default configuration file
    InitConfig(InitConfigArgs),
}

/// Feed selection shared by `serve` and `check`
#[derive(Args, Debug, Clone, Default)]
pub struct FeedArgs {
    /// Upstream schedule URL
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Feed format: auto, json or xml
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<FeedFormat>,
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Refresh interval in minutes
    #[arg(short, long, value_name = "MINUTES")]
    pub refresh: Option<u64>,

    /// Persist the schedule snapshot to this file
    #[arg(long, value_name = "FILE")]
    pub persist: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Number of presentations to list
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for the init-config command
#[derive(Args, Debug, Clone, Default)]
pub struct InitConfigArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level forced by verbosity flags, if any
    ///
    /// `None` leaves the level to `RUST_LOG` or the config file.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::TRACE)
        } else if self.global.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }

    /// Config overrides carried by the selected subcommand
    pub fn overrides(&self) -> ConfigOverrides {
        match &self.command {
            Commands::Serve(args) => args.overrides(),
            Commands::Check(args) => args.feed.overrides(),
            Commands::InitConfig(_) => ConfigOverrides::default(),
        }
    }
}

impl FeedArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            format: self.format,
            ..ConfigOverrides::default()
        }
    }
}

impl ServeArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            refresh_minutes: self.refresh,
            persist: self.persist.clone(),
            ..self.feed.overrides()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::parse_from([
            "signs",
            "serve",
            "--port",
            "8080",
            "--url",
            "http://localhost:9000/signs",
            "--refresh",
            "2",
            "--format",
            "xml",
            "--persist",
            "snapshot.json",
        ]);

        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(8080));
        assert_eq!(overrides.url.as_deref(), Some("http://localhost:9000/signs"));
        assert_eq!(overrides.refresh_minutes, Some(2));
        assert_eq!(overrides.format, Some(FeedFormat::Xml));
        assert_eq!(overrides.persist, Some(PathBuf::from("snapshot.json")));
    }

    #[test]
    fn test_check_overrides_only_feed() {
        let cli = Cli::parse_from(["signs", "check", "-f", "json"]);

        let overrides = cli.overrides();
        assert_eq!(overrides.format, Some(FeedFormat::Json));
        assert!(overrides.port.is_none());
        assert!(overrides.refresh_minutes.is_none());
        assert!(matches!(cli.command, Commands::Check(CheckArgs { limit: 10, .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["signs", "serve", "--port", "70000"]).is_err());
        assert!(Cli::try_parse_from(["signs", "serve", "--port", "abc"]).is_err());
        assert!(Cli::try_parse_from(["signs", "serve", "--refresh", "-5"]).is_err());
        assert!(Cli::try_parse_from(["signs", "serve", "--format", "yaml"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let quiet = Cli::parse_from(["signs", "-q", "serve"]);
        let verbose = Cli::parse_from(["signs", "serve", "--verbose"]);
        let very_verbose = Cli::parse_from(["signs", "--very-verbose", "check"]);
        let default = Cli::parse_from(["signs", "init-config"]);

        assert_eq!(quiet.log_level(), Some(tracing::Level::ERROR));
        assert_eq!(verbose.log_level(), Some(tracing::Level::DEBUG));
        assert_eq!(very_verbose.log_level(), Some(tracing::Level::TRACE));
        assert_eq!(default.log_level(), None);
    }
}
