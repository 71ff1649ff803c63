//! auth::token_file
//!
//! Token source backed by `~/.<platform>-token`.
//!
//! # File Format
//!
//! One token per line:
//!
//! ```text
//! mytoken_for_github_com
//! myothertoken_for_git_example_org git.example.org
//! yetanothertoken_for_git_example_com git.example.com
//! ```
//!
//! A bare token applies to the platform's default domain only; a token
//! followed by a space and a hostname applies to that host. The first
//! matching line wins.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use super::{AccessToken, TokenSource};
use crate::forge::{Domain, ForgeError, Platform};

/// Find the token for `domain` among token-file lines.
///
/// A line matches if, after trimming trailing whitespace, it ends with
/// `" " + domain`; the token is the text before the first space. If
/// `domain` is the platform default, a line without any space matches too.
///
/// ```
/// use forgelink::auth::find_access_token_for_domain;
/// use forgelink::forge::{Domain, Platform};
///
/// let lines = ["tokA", "tokB git.example.com"];
/// let domain = Domain::new(Platform::GitLab, Some("git.example.com"));
/// assert_eq!(find_access_token_for_domain(lines, &domain), Some("tokB".to_string()));
/// ```
pub fn find_access_token_for_domain<'a, I>(lines: I, domain: &Domain) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let suffix = format!(" {}", domain.value());
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line.ends_with(&suffix) {
            return line.split(' ').next().map(str::to_string);
        }
        if domain.is_default() && !line.contains(' ') {
            return Some(line.to_string());
        }
    }
    None
}

/// Reads tokens from a token file.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: Option<PathBuf>,
    display_path: String,
}

impl FileTokenSource {
    /// The platform's token file in the user's home directory.
    pub fn in_home(platform: Platform) -> Self {
        let name = platform.token_file_name();
        Self {
            path: dirs::home_dir().map(|home| home.join(name)),
            display_path: format!("~/{}", name),
        }
    }

    /// A token file at an explicit location.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            display_path: path.display().to_string(),
            path: Some(path),
        }
    }

    /// Read the file; a missing file yields `None`.
    fn read(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!("File `{}` exists", path.display());
                Some(contents)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!("Could not read `{}`: {}", path.display(), e);
                None
            }
        }
    }
}

impl TokenSource for FileTokenSource {
    fn description(&self) -> String {
        format!("content of the `{}` file", self.display_path)
    }

    fn token_for(&self, domain: &Domain) -> Result<Option<AccessToken>, ForgeError> {
        debug!("Trying to find token in `{}`", self.display_path);
        let Some(contents) = self.read() else {
            return Ok(None);
        };
        Ok(
            find_access_token_for_domain(contents.lines(), domain).map(|token| {
                AccessToken::new(
                    token,
                    format!("auth token for {} from `{}`", domain, self.display_path),
                )
            }),
        )
    }
}
