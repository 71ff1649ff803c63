//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::forge::Platform;

/// forgelink - Token discovery and API access for GitHub and GitLab
#[derive(Parser, Debug)]
#[command(name = "forgelink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if forgelink was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Platform selector.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformArg {
    /// GitHub or GitHub Enterprise
    Github,
    /// GitLab or self-managed GitLab
    Gitlab,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Github => Platform::GitHub,
            PlatformArg::Gitlab => Platform::GitLab,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which provider supplies the access token
    #[command(
        name = "token",
        long_about = "Show which provider supplies the access token.\n\n\
            Runs token discovery for the configured (or given) domain and reports \
            where the token came from. The token value itself is never printed.",
        after_help = "\
EXAMPLES:
    # Which GitHub token would be used in this repository?
    forgelink token --platform github

    # Check a self-managed GitLab instance
    forgelink token --platform gitlab --domain git.example.com"
    )]
    Token {
        /// Platform to discover a token for
        #[arg(long, value_enum)]
        platform: PlatformArg,

        /// Host to discover a token for (default: configured domain)
        #[arg(long)]
        domain: Option<String>,
    },

    /// List the places a token is looked up, in order
    Providers {
        /// Platform to list token providers for
        #[arg(long, value_enum)]
        platform: PlatformArg,
    },

    /// Print the login of the authenticated user
    Whoami {
        /// Platform to query
        #[arg(long, value_enum)]
        platform: PlatformArg,
    },

    /// Print the repository's default pull/merge request description template
    Template {
        /// Platform to query
        #[arg(long, value_enum)]
        platform: PlatformArg,
    },
}
