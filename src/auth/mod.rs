//! auth - Access token discovery
//!
//! Finds a usable access token for a [`Domain`] the way a developer already
//! authenticates with each platform, so no separate configuration is needed.
//!
//! # Discovery Order
//!
//! 1. Environment variable (`GITHUB_TOKEN`, `GITLAB_TOKEN`)
//! 2. Token file in the home directory (`~/.github-token`, `~/.gitlab-token`)
//! 3. The platform's official CLI (`gh`, `glab`), if installed
//!
//! The first source yielding a token wins. Exhaustion is not an error.
//!
//! # Components
//!
//! - [`AccessToken`] - Token value plus a description of its origin
//! - [`TokenSource`] - One place a token can come from
//! - [`TokenDiscovery`] - Ordered chain of sources
//!
//! # Security
//!
//! Token values never appear in logs, errors, or `Debug` output. Only the
//! provider description is shown to the user.
//!
//! # Example
//!
//! ```no_run
//! use forgelink::auth::TokenDiscovery;
//! use forgelink::forge::{Domain, Platform};
//!
//! let discovery = TokenDiscovery::for_platform(Platform::GitHub);
//! let domain = Domain::default_for(Platform::GitHub);
//! if let Some(token) = discovery.discover(&domain).unwrap() {
//!     println!("Using {}", token.provider());
//! }
//! ```
//!
//! [`Domain`]: crate::forge::Domain

mod discovery;
mod env;
mod helper_cli;
mod token;
mod token_file;

pub use discovery::TokenDiscovery;
pub use env::EnvTokenSource;
pub use helper_cli::{
    extract_status_token, parse_cli_version, CliTokenSource, CommandOutput, CommandRunner,
    SystemCommandRunner,
};
pub use token::AccessToken;
pub use token_file::{find_access_token_for_domain, FileTokenSource};

use crate::forge::{Domain, ForgeError};

/// One place an access token can be found.
pub trait TokenSource {
    /// Short description for the list of possible providers.
    fn description(&self) -> String;

    /// Look up a token for `domain`.
    ///
    /// Returns `Ok(None)` to fall through to the next source.
    fn token_for(&self, domain: &Domain) -> Result<Option<AccessToken>, ForgeError>;
}
