//! cli::commands::providers
//!
//! List the places an access token is looked up.

use anyhow::Result;

use crate::auth::TokenDiscovery;
use crate::cli::Context;
use crate::forge::Platform;
use crate::ui::output;

/// Run the providers command.
pub fn providers(ctx: &Context, platform: Platform) -> Result<()> {
    let discovery = TokenDiscovery::for_platform(platform);
    output::print(
        format!(
            "{} tokens are looked up in the following places, in order:\n{}",
            platform.display_name(),
            discovery.possible_providers()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
