//! cli::commands::whoami
//!
//! Print the login of the user owning the discovered token.

use anyhow::{bail, Result};

use super::{block_on, forge_for};
use crate::cli::Context;
use crate::forge::Platform;

/// Run the whoami command.
pub fn whoami(ctx: &Context, platform: Platform) -> Result<()> {
    block_on(whoami_async(ctx, platform))
}

async fn whoami_async(ctx: &Context, platform: Platform) -> Result<()> {
    let forge = forge_for(ctx, platform)?;
    match forge.current_user_login().await? {
        Some(login) => {
            // Printed even in quiet mode; the login is the result
            println!("{}", login);
            Ok(())
        }
        None => bail!(
            "No {} token found for {}. Run `forgelink providers --platform {}` to see where tokens are looked up.",
            platform.display_name(),
            forge.domain(),
            platform.name()
        ),
    }
}
