//! forge::project
//!
//! Repository/project addressing.
//!
//! # Design
//!
//! A [`ProjectRef`] identifies a remote repository either by its numeric id
//! or by its namespaced path. GitHub uses a single-segment namespace (the
//! organization); GitLab namespaces can nest groups up to
//! [`MAX_NAMESPACE_DEPTH`] levels.
//!
//! Addressing is validated before any request is built: a reference with
//! neither an id nor a namespace and path cannot be turned into an API path
//! and yields [`ForgeError::Addressing`].

use std::fmt;

use super::platform::{Domain, Platform};
use super::traits::ForgeError;

/// Deepest group nesting GitLab allows.
pub const MAX_NAMESPACE_DEPTH: usize = 20;

/// A possibly nested namespace (`group/subgroup/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(Vec<String>);

impl Namespace {
    /// Parse a `/`-separated namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Addressing`] if the namespace is empty, has an
    /// empty segment, or nests deeper than [`MAX_NAMESPACE_DEPTH`].
    ///
    /// ```
    /// use forgelink::forge::Namespace;
    ///
    /// let ns = Namespace::parse("acme/platform").unwrap();
    /// assert_eq!(ns.segments(), ["acme", "platform"]);
    /// assert!(Namespace::parse("acme//platform").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ForgeError> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(ForgeError::Addressing("namespace must not be empty".into()));
        }
        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ForgeError::Addressing(format!(
                "namespace `{}` contains an empty segment",
                s
            )));
        }
        if segments.len() > MAX_NAMESPACE_DEPTH {
            return Err(ForgeError::Addressing(format!(
                "namespace `{}` is nested {} levels deep, at most {} are supported",
                s,
                segments.len(),
                MAX_NAMESPACE_DEPTH
            )));
        }
        Ok(Self(segments))
    }

    /// Namespace segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Reference to a remote repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRef {
    /// Numeric id assigned by the platform
    pub id: Option<String>,
    /// Repository/project name (last path segment)
    pub path: Option<String>,
    /// Owning organization or group path
    pub namespace: Option<Namespace>,
}

impl ProjectRef {
    /// Reference by namespace and path.
    pub fn from_path(namespace: Namespace, path: impl Into<String>) -> Self {
        Self {
            id: None,
            path: Some(path.into()),
            namespace: Some(namespace),
        }
    }

    /// Reference by numeric id.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            path: None,
            namespace: None,
        }
    }

    /// `namespace/path`, when both are known.
    pub fn full_path(&self) -> Option<String> {
        match (&self.namespace, &self.path) {
            (Some(ns), Some(path)) => Some(format!("{}/{}", ns, path)),
            _ => None,
        }
    }

    /// API path addressing this repository on `platform`.
    ///
    /// A namespaced path is preferred over the id on GitHub (it is what
    /// users see); GitLab prefers the id, which survives renames.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Addressing`] if neither an id nor a namespace
    /// and path are present, or if a GitHub namespace is nested.
    ///
    /// ```
    /// use forgelink::forge::{Namespace, Platform, ProjectRef};
    ///
    /// let project = ProjectRef::from_path(Namespace::parse("acme/tools").unwrap(), "cli");
    /// assert_eq!(
    ///     project.api_base_path(Platform::GitLab).unwrap(),
    ///     "/projects/acme%2Ftools%2Fcli"
    /// );
    /// ```
    pub fn api_base_path(&self, platform: Platform) -> Result<String, ForgeError> {
        match platform {
            Platform::GitHub => {
                if let (Some(ns), Some(path)) = (&self.namespace, &self.path) {
                    if ns.depth() != 1 {
                        return Err(ForgeError::Addressing(format!(
                            "GitHub organization `{}` must be a single path segment",
                            ns
                        )));
                    }
                    return Ok(format!("/repos/{}/{}", ns, path));
                }
                if let Some(id) = &self.id {
                    return Ok(format!("/repositories/{}", id));
                }
            }
            Platform::GitLab => {
                if let Some(id) = &self.id {
                    return Ok(format!("/projects/{}", id));
                }
                if let Some(full) = self.full_path() {
                    return Ok(format!("/projects/{}", full.replace('/', "%2F")));
                }
            }
        }
        Err(self.addressing_error(platform))
    }

    pub(crate) fn addressing_error(&self, platform: Platform) -> ForgeError {
        let hint = match platform {
            Platform::GitHub => {
                "set `forgelink.github.organization` and `forgelink.github.repository`"
            }
            Platform::GitLab => {
                "set `forgelink.gitlab.projectId`, or `forgelink.gitlab.namespace` and `forgelink.gitlab.projectPath`"
            }
        };
        ForgeError::Addressing(format!(
            "cannot address the {} repository: neither an id nor a namespace and path is known; {}",
            platform.display_name(),
            hint
        ))
    }

    /// Derive a reference from a git remote URL pointing at `domain`.
    ///
    /// Supports the SSH (`git@host:ns/path.git`), `ssh://` and HTTP(S)
    /// forms, with or without `.git` and user info. Returns `None` if the
    /// URL does not point at `domain` or has fewer than two path segments.
    ///
    /// ```
    /// use forgelink::forge::{Domain, Platform, ProjectRef};
    ///
    /// let domain = Domain::default_for(Platform::GitLab);
    /// let project = ProjectRef::from_remote_url(&domain, "git@gitlab.com:acme/tools/cli.git").unwrap();
    /// assert_eq!(project.full_path().as_deref(), Some("acme/tools/cli"));
    /// ```
    pub fn from_remote_url(domain: &Domain, url: &str) -> Option<Self> {
        let rest = strip_host(url.trim(), domain.value())?;
        let rest = rest.trim_matches('/');
        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        let (namespace, path) = rest.rsplit_once('/')?;
        if path.is_empty() {
            return None;
        }
        let namespace = Namespace::parse(namespace).ok()?;
        if domain.platform() == Platform::GitHub && namespace.depth() != 1 {
            return None;
        }
        Some(Self::from_path(namespace, path))
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.full_path(), &self.id) {
            (Some(full), _) => write!(f, "{}", full),
            (None, Some(id)) => write!(f, "#{}", id),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

/// Strip scheme, user info, and host from a remote URL.
///
/// Returns the path part if the host matches `host`.
fn strip_host<'a>(url: &'a str, host: &str) -> Option<&'a str> {
    if let Some(after_scheme) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://"))
    {
        let (authority, path) = after_scheme.split_once('/')?;
        let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let hostname = authority.split(':').next().unwrap_or(authority);
        return (hostname.eq_ignore_ascii_case(host)).then_some(path);
    }

    // scp-like syntax: [user@]host:path
    let (authority, path) = url.split_once(':')?;
    let hostname = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    (hostname.eq_ignore_ascii_case(host) && !path.starts_with("//")).then_some(path)
}
