//! forge::factory
//!
//! Forge selection and creation.
//!
//! # Design
//!
//! Commands use [`create_forge`] instead of constructing provider clients
//! directly. The factory:
//!
//! 1. Resolves per-platform settings (git config keys over the config
//!    file over defaults) into a [`Domain`] and a [`ProjectRef`], deriving
//!    the project from the remote URL when nothing names it explicitly.
//! 2. Runs token discovery once for the resolved domain.
//! 3. Builds an [`ApiClient`] and wraps it in the platform's client.
//!
//! An incomplete project reference is not an error here; it surfaces as
//! [`ForgeError::Addressing`] from the first operation that needs it.
//!
//! # Example
//!
//! ```ignore
//! use forgelink::core::config::Config;
//! use forgelink::forge::{create_forge, ForgeOptions, Platform};
//! use forgelink::git::Git;
//!
//! let git = Git::open(Path::new("."))?;
//! let forge = create_forge(Platform::GitLab, &Config::load()?, Some(&git), &ForgeOptions::default())?;
//! println!("{:?}", forge.current_user_login().await?);
//! ```

use tracing::debug;

use super::executor::ApiClient;
use super::github::GitHubForge;
use super::gitlab::GitLabForge;
use super::platform::{Domain, Platform};
use super::project::{Namespace, ProjectRef};
use super::traits::{Forge, ForgeError};
use crate::auth::TokenDiscovery;
use crate::core::config::{validate_domain, Config, SettingKey};
use crate::git::{Git, GitError};
use crate::ui::output::Verbosity;

/// Remote used to derive the project when none is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Client construction options.
#[derive(Debug, Clone)]
pub struct ForgeOptions {
    /// Verbosity for warnings surfaced by the client
    pub verbosity: Verbosity,
    /// Replacement for `https://<api host>` (tests, proxies)
    pub base_url: Option<String>,
}

impl Default for ForgeOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            base_url: None,
        }
    }
}

/// Resolved settings for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgeSettings {
    /// Platform instance to talk to
    pub domain: Domain,
    /// Remote the project was (or would be) derived from
    pub remote: String,
    /// Repository reference; may be incomplete
    pub project: ProjectRef,
}

impl ForgeSettings {
    /// Resolve settings for `platform`.
    ///
    /// `git` is the repository whose config keys and remotes are
    /// consulted; without one only the config file applies.
    ///
    /// # Errors
    ///
    /// [`ForgeError::Addressing`] for an unparsable namespace,
    /// [`ForgeError::Unexpected`] if git config cannot be read or the
    /// configured domain is not a bare host name.
    pub fn resolve(
        platform: Platform,
        config: &Config,
        git: Option<&Git>,
    ) -> Result<Self, ForgeError> {
        let lookup = |key: SettingKey| -> Result<Option<String>, ForgeError> {
            if let (Some(git), Some(git_key)) = (git, key.git_key(platform)) {
                if let Some(value) = git.config_string(&git_key).map_err(git_error)? {
                    debug!("{} = {} (git config)", git_key, value);
                    return Ok(Some(value));
                }
            }
            Ok(config.get(platform, key).map(str::to_string))
        };

        // Git config values bypass the file schema validation
        let configured_domain = lookup(SettingKey::Domain)?;
        let domain_key = SettingKey::Domain.git_key(platform).unwrap_or_default();
        validate_domain(&domain_key, configured_domain.as_deref())
            .map_err(|e| ForgeError::Unexpected(e.to_string()))?;
        let domain = Domain::new(platform, configured_domain.as_deref());
        let remote = lookup(SettingKey::Remote)?.unwrap_or_else(|| DEFAULT_REMOTE.to_string());

        let mut project = match platform {
            Platform::GitHub => {
                match (
                    lookup(SettingKey::Organization)?,
                    lookup(SettingKey::Repository)?,
                ) {
                    (Some(org), Some(repo)) => ProjectRef::from_path(Namespace::parse(&org)?, repo),
                    _ => ProjectRef::default(),
                }
            }
            Platform::GitLab => {
                let namespace = lookup(SettingKey::Namespace)?
                    .map(|ns| Namespace::parse(&ns))
                    .transpose()?;
                let path = lookup(SettingKey::ProjectPath)?;
                let (namespace, path) = match (namespace, path) {
                    (Some(ns), Some(path)) => (Some(ns), Some(path)),
                    _ => (None, None),
                };
                ProjectRef {
                    id: lookup(SettingKey::ProjectId)?,
                    path,
                    namespace,
                }
            }
        };

        if project.id.is_none() && project.full_path().is_none() {
            if let Some(git) = git {
                if let Some(url) = git.remote_url(&remote).map_err(git_error)? {
                    match ProjectRef::from_remote_url(&domain, &url) {
                        Some(derived) => {
                            debug!("Derived {} from remote `{}`", derived, remote);
                            project = derived;
                        }
                        None => debug!(
                            "Remote `{}` ({}) does not point at {}",
                            remote, url, domain
                        ),
                    }
                }
            }
        }

        Ok(Self {
            domain,
            remote,
            project,
        })
    }
}

/// Create a client for `platform` from configuration.
///
/// Token discovery runs once, here.
pub fn create_forge(
    platform: Platform,
    config: &Config,
    git: Option<&Git>,
    options: &ForgeOptions,
) -> Result<Box<dyn Forge>, ForgeError> {
    let settings = ForgeSettings::resolve(platform, config, git)?;
    let discovery = TokenDiscovery::for_platform(platform);
    build_forge(settings, &discovery, options)
}

/// Create a client from resolved settings and a discovery chain.
pub fn build_forge(
    settings: ForgeSettings,
    discovery: &TokenDiscovery,
    options: &ForgeOptions,
) -> Result<Box<dyn Forge>, ForgeError> {
    let token = discovery.discover(&settings.domain)?;
    let platform = settings.domain.platform();
    let mut api = ApiClient::new(settings.domain, token, discovery.possible_providers())?;
    if let Some(base_url) = &options.base_url {
        api = api.with_base_url(base_url.clone());
    }

    Ok(match platform {
        Platform::GitHub => Box::new(
            GitHubForge::new(api, settings.project).with_verbosity(options.verbosity),
        ),
        Platform::GitLab => Box::new(
            GitLabForge::new(api, settings.project).with_verbosity(options.verbosity),
        ),
    })
}

fn git_error(err: GitError) -> ForgeError {
    ForgeError::Unexpected(err.to_string())
}
