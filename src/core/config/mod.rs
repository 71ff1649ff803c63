//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Settings are resolved per platform in this order (later overrides
//! earlier):
//! 1. Built-in defaults (public host, `origin` remote)
//! 2. Global config file
//! 3. Git config keys of the current repository (see [`SettingKey`])
//!
//! This module only handles the file layer; the git layer is applied by
//! the forge factory.
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$FORGELINK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/forgelink/config.toml`
//! 3. `~/.forgelink/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use forgelink::core::config::{Config, SettingKey};
//! use forgelink::forge::Platform;
//!
//! let config = Config::load().unwrap();
//! if let Some(domain) = config.get(Platform::GitLab, SettingKey::Domain) {
//!     println!("GitLab domain: {}", domain);
//! }
//! ```

pub mod schema;

pub use schema::{FileConfig, GitHubConfig, GitLabConfig};
pub(crate) use schema::validate_domain;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::forge::Platform;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// A per-platform setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    /// Host of the platform instance
    Domain,
    /// Remote the repository is derived from
    Remote,
    /// GitHub organization
    Organization,
    /// GitHub repository name
    Repository,
    /// GitLab numeric project id
    ProjectId,
    /// GitLab project path
    ProjectPath,
    /// GitLab group path
    Namespace,
}

impl SettingKey {
    /// Git config key overriding this setting, or `None` if the setting
    /// does not exist for `platform`.
    ///
    /// ```
    /// use forgelink::core::config::SettingKey;
    /// use forgelink::forge::Platform;
    ///
    /// assert_eq!(
    ///     SettingKey::ProjectId.git_key(Platform::GitLab).as_deref(),
    ///     Some("forgelink.gitlab.projectId")
    /// );
    /// assert_eq!(SettingKey::ProjectId.git_key(Platform::GitHub), None);
    /// ```
    pub fn git_key(&self, platform: Platform) -> Option<String> {
        let name = match (self, platform) {
            (SettingKey::Domain, _) => "domain",
            (SettingKey::Remote, _) => "remote",
            (SettingKey::Organization, Platform::GitHub) => "organization",
            (SettingKey::Repository, Platform::GitHub) => "repository",
            (SettingKey::ProjectId, Platform::GitLab) => "projectId",
            (SettingKey::ProjectPath, Platform::GitLab) => "projectPath",
            (SettingKey::Namespace, Platform::GitLab) => "namespace",
            _ => return None,
        };
        Some(format!("forgelink.{}.{}", platform.name(), name))
    }
}

/// Loaded global configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    file: FileConfig,
    /// Path the config was loaded from (if any)
    path: Option<PathBuf>,
}

impl From<FileConfig> for Config {
    fn from(file: FileConfig) -> Self {
        Self { file, path: None }
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        match Self::locate(lookup, dirs::home_dir()) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// First existing config file among the standard locations.
    fn locate(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
        let candidates = [
            env("FORGELINK_CONFIG").map(PathBuf::from),
            env("XDG_CONFIG_HOME").map(|xdg| PathBuf::from(xdg).join("forgelink/config.toml")),
            home.map(|h| h.join(".forgelink/config.toml")),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Value of `key` for `platform` from the config file.
    pub fn get(&self, platform: Platform, key: SettingKey) -> Option<&str> {
        let value = match platform {
            Platform::GitHub => {
                let section = self.file.github.as_ref()?;
                match key {
                    SettingKey::Domain => &section.domain,
                    SettingKey::Remote => &section.remote,
                    SettingKey::Organization => &section.organization,
                    SettingKey::Repository => &section.repository,
                    _ => return None,
                }
            }
            Platform::GitLab => {
                let section = self.file.gitlab.as_ref()?;
                match key {
                    SettingKey::Domain => &section.domain,
                    SettingKey::Remote => &section.remote,
                    SettingKey::ProjectId => &section.project_id,
                    SettingKey::ProjectPath => &section.project_path,
                    SettingKey::Namespace => &section.namespace,
                    _ => return None,
                }
            }
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
