//! cli::commands::token
//!
//! Report which provider supplies the access token.
//!
//! # Security
//!
//! The token value is NEVER printed, only the provider description.
//!
//! # Example
//!
//! ```bash
//! forgelink token --platform gitlab
//! forgelink token --platform github --domain ghe.example.com
//!
//! # Machine-readable
//! forgelink -q token --platform github
//! ```

use anyhow::{Context as _, Result};

use super::open_repo;
use crate::auth::TokenDiscovery;
use crate::cli::Context;
use crate::core::config::Config;
use crate::forge::{Domain, ForgeSettings, Platform};

/// Run the token command.
///
/// # Arguments
///
/// * `ctx` - CLI context
/// * `platform` - Platform to discover a token for
/// * `domain` - Host override; defaults to the configured domain
pub fn token(ctx: &Context, platform: Platform, domain: Option<&str>) -> Result<()> {
    let domain = match domain {
        Some(host) => Domain::new(platform, Some(host)),
        None => {
            let config = Config::load().context("Failed to load configuration")?;
            let git = open_repo(ctx)?;
            ForgeSettings::resolve(platform, &config, git.as_ref())?.domain
        }
    };

    let discovery = TokenDiscovery::for_platform(platform);
    let found = discovery.discover(&domain)?;

    if ctx.quiet {
        // Machine-readable output
        println!("{}", if found.is_some() { "found" } else { "not_found" });
        return Ok(());
    }

    match found {
        Some(token) => println!("Using {}.", token.provider()),
        None => {
            println!(
                "No {} token found for {}.\n\
                 A token can be provided in one of the following ways:\n{}",
                platform.display_name(),
                domain,
                discovery.possible_providers()
            );
        }
    }

    Ok(())
}
