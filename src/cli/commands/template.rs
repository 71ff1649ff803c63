//! cli::commands::template
//!
//! Print the repository's default pull/merge request description template.
//!
//! # Example
//!
//! ```bash
//! forgelink template --platform github > description.md
//! ```

use anyhow::Result;

use super::{block_on, forge_for};
use crate::cli::Context;
use crate::forge::Platform;
use crate::ui::output;

/// Run the template command.
pub fn template(ctx: &Context, platform: Platform) -> Result<()> {
    block_on(template_async(ctx, platform))
}

async fn template_async(ctx: &Context, platform: Platform) -> Result<()> {
    let forge = forge_for(ctx, platform)?;
    match forge.description_template().await? {
        Some(text) => print!("{}", text),
        None => output::warn(
            format!(
                "no default {} description template found",
                platform.change_request_noun()
            ),
            ctx.verbosity(),
        ),
    }
    Ok(())
}
