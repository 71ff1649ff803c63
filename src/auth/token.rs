//! auth::token
//!
//! Access token value type.

use std::fmt;

/// An opaque bearer credential plus a description of where it came from.
///
/// # Security
///
/// The token value never appears in `Debug` output, logs, or error
/// messages. Only [`provider`](AccessToken::provider) is shown to users.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    provider: String,
}

impl AccessToken {
    /// Create a token found by `provider`.
    pub fn new(value: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            provider: provider.into(),
        }
    }

    /// The secret value. Only for building the `Authorization` header.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Human-readable origin, e.g. `` `GITHUB_TOKEN` environment variable ``.
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

// Custom Debug to avoid exposing the value
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}
