//! forge::platform
//!
//! Platform and domain identity.
//!
//! # Design
//!
//! A [`Platform`] is a closed tag (`GitHub` or `GitLab`) carrying all of the
//! per-platform metadata the rest of the crate needs: default host, token
//! sources, helper CLI, and API path rules. A [`Domain`] pairs a platform
//! with the resolved host of one hosting instance.
//!
//! Nothing here performs I/O. URL composition is pure string work so the
//! executor can be reused unchanged across providers.
//!
//! # Example
//!
//! ```
//! use forgelink::forge::{Domain, Platform};
//!
//! let domain = Domain::new(Platform::GitLab, Some("git.example.com"));
//! assert_eq!(domain.url_prefix_for("/graphql"), "https://git.example.com/api");
//! assert_eq!(domain.url_prefix_for("/user"), "https://git.example.com/api/v4");
//! ```

use std::fmt;

/// Supported code-hosting platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// GitHub (github.com or GitHub Enterprise)
    GitHub,
    /// GitLab (gitlab.com or self-managed)
    GitLab,
}

/// Path used for GraphQL requests on every platform.
pub const GRAPHQL_PATH: &str = "/graphql";

impl Platform {
    /// All platforms, in display order.
    pub fn all() -> &'static [Platform] {
        &[Platform::GitHub, Platform::GitLab]
    }

    /// Lowercase name, as used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::GitHub => "github",
            Platform::GitLab => "gitlab",
        }
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::GitHub => "GitHub",
            Platform::GitLab => "GitLab",
        }
    }

    /// Parse a platform from its name (case-insensitive).
    ///
    /// ```
    /// use forgelink::forge::Platform;
    ///
    /// assert_eq!(Platform::parse("GitLab"), Some(Platform::GitLab));
    /// assert_eq!(Platform::parse("bitbucket"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(Platform::GitHub),
            "gitlab" => Some(Platform::GitLab),
            _ => None,
        }
    }

    /// Well-known public host.
    pub fn default_host(&self) -> &'static str {
        match self {
            Platform::GitHub => "github.com",
            Platform::GitLab => "gitlab.com",
        }
    }

    /// Environment variable holding a raw token.
    ///
    /// Same names as the official CLIs use.
    pub fn token_env_var(&self) -> &'static str {
        match self {
            Platform::GitHub => "GITHUB_TOKEN",
            Platform::GitLab => "GITLAB_TOKEN",
        }
    }

    /// Token file name, relative to the home directory.
    pub fn token_file_name(&self) -> &'static str {
        match self {
            Platform::GitHub => ".github-token",
            Platform::GitLab => ".gitlab-token",
        }
    }

    /// Official CLI tool that can report a token.
    pub fn helper_cli(&self) -> HelperCli {
        match self {
            // `gh auth status --show-token` prints the token since 2.17.0
            Platform::GitHub => HelperCli {
                name: "gh",
                description: "GitHub CLI",
                min_version: (2, 17, 0),
            },
            // `glab auth status` was added in 1.14.0
            Platform::GitLab => HelperCli {
                name: "glab",
                description: "GitLab CLI",
                min_version: (1, 14, 0),
            },
        }
    }

    /// Scope a token needs to access repositories.
    pub fn required_scope(&self) -> &'static str {
        match self {
            Platform::GitHub => "repo",
            Platform::GitLab => "api",
        }
    }

    /// Whether 307 responses for renamed repositories are repaired.
    ///
    /// Only GitHub renumbers renamed repositories under `/repositories/<id>/`.
    pub fn repairs_redirects(&self) -> bool {
        matches!(self, Platform::GitHub)
    }

    /// What the platform calls a change request.
    pub fn change_request_noun(&self) -> &'static str {
        match self {
            Platform::GitHub => "pull request",
            Platform::GitLab => "merge request",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Metadata about a platform's official CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperCli {
    /// Binary name (`gh`, `glab`)
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// First version whose `auth status --show-token` reports the token
    pub min_version: (u32, u32, u32),
}

/// A hosting instance of a platform.
///
/// `value` is the configured host, or the platform default when none was
/// configured. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    platform: Platform,
    value: String,
}

impl Domain {
    /// Resolve a domain from a possibly empty configured host.
    pub fn new(platform: Platform, configured: Option<&str>) -> Self {
        let value = configured
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(platform.default_host())
            .to_string();
        Self { platform, value }
    }

    /// The platform default domain.
    pub fn default_for(platform: Platform) -> Self {
        Self::new(platform, None)
    }

    /// The platform this domain belongs to.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The resolved host.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The platform's well-known host.
    pub fn default_value(&self) -> &'static str {
        self.platform.default_host()
    }

    /// Whether this is the platform's public instance.
    pub fn is_default(&self) -> bool {
        self.value == self.default_value()
    }

    /// Host serving the API.
    ///
    /// Public GitHub serves its API from a dedicated host; everything else
    /// serves it from the instance host.
    pub fn api_host(&self) -> &str {
        match self.platform {
            Platform::GitHub if self.is_default() => "api.github.com",
            _ => &self.value,
        }
    }

    /// Path prefix to put between the API host and `path`.
    pub fn api_path_prefix(&self, path: &str) -> &'static str {
        match self.platform {
            Platform::GitHub if self.is_default() => "",
            Platform::GitHub | Platform::GitLab if path == GRAPHQL_PATH => "/api",
            Platform::GitHub => "/api/v3",
            Platform::GitLab => "/api/v4",
        }
    }

    /// Full API root for `path` (scheme, host, and prefix).
    pub fn url_prefix_for(&self, path: &str) -> String {
        format!("https://{}{}", self.api_host(), self.api_path_prefix(path))
    }

    /// Web page where the user can create a new token.
    pub fn token_creation_url(&self) -> String {
        match self.platform {
            Platform::GitHub => format!("https://{}/settings/tokens", self.value),
            Platform::GitLab => {
                format!("https://{}/-/user_settings/personal_access_tokens", self.value)
            }
        }
    }

    /// Web URL of a repository, as used in `git remote set-url`.
    pub fn repository_web_url(&self, full_name: &str) -> String {
        format!("https://{}/{}.git", self.value, full_name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
