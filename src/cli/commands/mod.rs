//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves settings (config file, then the repository at `--cwd`)
//! 2. Calls token discovery or a forge client
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to a platform API are async. Handlers are
//! synchronous wrappers that build a current-thread tokio runtime and
//! block on the async implementation.

mod providers;
mod template;
mod token;
mod whoami;

pub use providers::providers;
pub use template::template;
pub use token::token;
pub use whoami::whoami;

use std::future::Future;

use anyhow::{Context as _, Result};
use tracing::debug;

use super::args::Command;
use super::Context;
use crate::core::config::Config;
use crate::forge::{create_forge, Forge, ForgeOptions, Platform};
use crate::git::Git;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Token { platform, domain } => token(ctx, platform.into(), domain.as_deref()),
        Command::Providers { platform } => providers(ctx, platform.into()),
        Command::Whoami { platform } => whoami(ctx, platform.into()),
        Command::Template { platform } => template(ctx, platform.into()),
    }
}

/// Open the repository at the working directory, if there is one.
///
/// Running outside a repository is fine: only the config file applies.
pub(crate) fn open_repo(ctx: &Context) -> Result<Option<Git>> {
    let cwd = match &ctx.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    match Git::open(&cwd) {
        Ok(git) => {
            debug!("Using repository at {}", git.git_dir().display());
            Ok(Some(git))
        }
        Err(e) => {
            debug!("{}", e);
            Ok(None)
        }
    }
}

/// Build a client for `platform` from the current settings.
pub(crate) fn forge_for(ctx: &Context, platform: Platform) -> Result<Box<dyn Forge>> {
    let config = Config::load().context("Failed to load configuration")?;
    let git = open_repo(ctx)?;
    let options = ForgeOptions {
        verbosity: ctx.verbosity(),
        base_url: None,
    };
    Ok(create_forge(platform, &config, git.as_ref(), &options)?)
}

/// Run an async command body on a current-thread runtime.
pub(crate) fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    rt.block_on(future)
}
