//! auth::env
//!
//! Token source backed by an environment variable.

use tracing::debug;

use super::{AccessToken, TokenSource};
use crate::forge::{Domain, ForgeError, Platform};

/// Reads a token from the platform's environment variable.
///
/// The variable applies to every domain; any non-empty value is accepted
/// as-is.
#[derive(Clone)]
pub struct EnvTokenSource {
    var: String,
    value: Option<String>,
}

impl EnvTokenSource {
    /// Snapshot the platform's variable from the process environment.
    pub fn from_env(platform: Platform) -> Self {
        let var = platform.token_env_var();
        Self::with_value(var, std::env::var(var).ok())
    }

    /// Source with an explicit value, as if `var` were set to it.
    pub fn with_value(var: impl Into<String>, value: Option<String>) -> Self {
        Self {
            var: var.into(),
            value,
        }
    }
}

impl std::fmt::Debug for EnvTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvTokenSource")
            .field("var", &self.var)
            .field("is_set", &self.value.is_some())
            .finish()
    }
}

impl TokenSource for EnvTokenSource {
    fn description(&self) -> String {
        format!("`{}` environment variable", self.var)
    }

    fn token_for(&self, _domain: &Domain) -> Result<Option<AccessToken>, ForgeError> {
        debug!("Trying to find token in `{}` environment variable", self.var);
        Ok(self
            .value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| AccessToken::new(v, self.description())))
    }
}
