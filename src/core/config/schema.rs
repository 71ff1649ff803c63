//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: domains must be bare host
//! names, remotes must be non-empty, and namespaces must parse.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::forge::Namespace;

/// Contents of the global config file.
///
/// # Example
///
/// ```toml
/// [github]
/// domain = "github.example.com"
/// remote = "origin"
/// organization = "acme"
/// repository = "widgets"
///
/// [gitlab]
/// domain = "gitlab.example.com"
/// project_id = "1234"
/// namespace = "acme/platform"
/// project_path = "widgets"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// GitHub settings
    pub github: Option<GitHubConfig>,

    /// GitLab settings
    pub gitlab: Option<GitLabConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(github) = &self.github {
            validate_domain("github.domain", github.domain.as_deref())?;
            validate_remote("github.remote", github.remote.as_deref())?;
            if let Some(org) = &github.organization {
                if org.is_empty() || org.contains('/') {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.organization `{}` must be a single path segment",
                        org
                    )));
                }
            }
        }

        if let Some(gitlab) = &self.gitlab {
            validate_domain("gitlab.domain", gitlab.domain.as_deref())?;
            validate_remote("gitlab.remote", gitlab.remote.as_deref())?;
            if let Some(namespace) = &gitlab.namespace {
                Namespace::parse(namespace).map_err(|e| {
                    ConfigError::InvalidValue(format!("gitlab.namespace: {}", e))
                })?;
            }
        }

        Ok(())
    }
}

/// `[github]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// GitHub Enterprise host (default: github.com)
    pub domain: Option<String>,

    /// Remote to derive the repository from (default: "origin")
    pub remote: Option<String>,

    /// Organization or user owning the repository
    pub organization: Option<String>,

    /// Repository name
    pub repository: Option<String>,
}

/// `[gitlab]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitLabConfig {
    /// Self-managed host (default: gitlab.com)
    pub domain: Option<String>,

    /// Remote to derive the project from (default: "origin")
    pub remote: Option<String>,

    /// Numeric project id
    pub project_id: Option<String>,

    /// Project path (last segment)
    pub project_path: Option<String>,

    /// Group path, possibly nested
    pub namespace: Option<String>,
}

/// A domain must be a bare host name.
pub(crate) fn validate_domain(key: &str, domain: Option<&str>) -> Result<(), ConfigError> {
    match domain {
        Some(d) if d.is_empty() || d.contains('/') || d.chars().any(char::is_whitespace) => {
            Err(ConfigError::InvalidValue(format!(
                "{} `{}` must be a bare host name, e.g. `git.example.com`",
                key, d
            )))
        }
        _ => Ok(()),
    }
}

fn validate_remote(key: &str, remote: Option<&str>) -> Result<(), ConfigError> {
    match remote {
        Some(r) if r.trim().is_empty() => Err(ConfigError::InvalidValue(format!(
            "{} cannot be empty",
            key
        ))),
        _ => Ok(()),
    }
}
