//! auth::discovery
//!
//! Ordered token discovery chain.
//!
//! # Design
//!
//! Discovery is an explicit list of [`TokenSource`]s evaluated in order with
//! first-success semantics. Sources never fail the chain by themselves: each
//! yields a token or falls through. The only error that escapes is a helper
//! CLI that is installed but reports a version string we cannot parse.

use tracing::debug;

use super::env::EnvTokenSource;
use super::helper_cli::CliTokenSource;
use super::token_file::FileTokenSource;
use super::{AccessToken, TokenSource};
use crate::forge::{Domain, ForgeError, Platform};

/// Token discovery chain for one platform.
pub struct TokenDiscovery {
    platform: Platform,
    sources: Vec<Box<dyn TokenSource>>,
}

impl TokenDiscovery {
    /// The standard chain: environment variable, token file, helper CLI.
    pub fn for_platform(platform: Platform) -> Self {
        Self::with_sources(
            platform,
            vec![
                Box::new(EnvTokenSource::from_env(platform)),
                Box::new(FileTokenSource::in_home(platform)),
                Box::new(CliTokenSource::new(platform.helper_cli())),
            ],
        )
    }

    /// A chain with custom sources, tried in the given order.
    pub fn with_sources(platform: Platform, sources: Vec<Box<dyn TokenSource>>) -> Self {
        Self { platform, sources }
    }

    /// Platform this chain discovers tokens for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Find a token for `domain`.
    ///
    /// Returns `Ok(None)` when every source is exhausted; the consequence is
    /// deferred to whichever API call needs the token.
    ///
    /// # Errors
    ///
    /// Only [`ForgeError::Unexpected`] from a misbehaving helper CLI.
    pub fn discover(&self, domain: &Domain) -> Result<Option<AccessToken>, ForgeError> {
        for source in &self.sources {
            if let Some(token) = source.token_for(domain)? {
                debug!("Using {}", token.provider());
                return Ok(Some(token));
            }
        }
        debug!("No {} token found for {}", self.platform.display_name(), domain);
        Ok(None)
    }

    /// Numbered list of the places a token is looked up, one per line.
    pub fn possible_providers(&self) -> String {
        self.sources
            .iter()
            .enumerate()
            .map(|(index, source)| format!("\t{}. {}", index + 1, capitalize(&source.description())))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for TokenDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDiscovery")
            .field("platform", &self.platform)
            .field("sources", &self.sources.len())
            .finish()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct StaticSource {
        name: &'static str,
        token: Option<&'static str>,
        calls: Rc<Cell<usize>>,
    }

    impl TokenSource for StaticSource {
        fn description(&self) -> String {
            self.name.to_string()
        }

        fn token_for(&self, _domain: &Domain) -> Result<Option<AccessToken>, ForgeError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.token.map(|t| AccessToken::new(t, self.name)))
        }
    }

    struct FailingSource;

    impl TokenSource for FailingSource {
        fn description(&self) -> String {
            "broken tool".to_string()
        }

        fn token_for(&self, _domain: &Domain) -> Result<Option<AccessToken>, ForgeError> {
            Err(ForgeError::Unexpected("bad version".into()))
        }
    }

    fn source(
        name: &'static str,
        token: Option<&'static str>,
    ) -> (Box<dyn TokenSource>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Box::new(StaticSource {
                name,
                token,
                calls: Rc::clone(&calls),
            }),
            calls,
        )
    }

    #[test]
    fn first_success_short_circuits() {
        let (a, a_calls) = source("first", None);
        let (b, _) = source("second", Some("tok2"));
        let (c, c_calls) = source("third", Some("tok3"));
        let chain = TokenDiscovery::with_sources(Platform::GitHub, vec![a, b, c]);

        let token = chain
            .discover(&Domain::default_for(Platform::GitHub))
            .unwrap()
            .unwrap();
        assert_eq!(token.value(), "tok2");
        assert_eq!(token.provider(), "second");
        assert_eq!(a_calls.get(), 1);
        assert_eq!(c_calls.get(), 0);
    }

    #[test]
    fn exhaustion_is_none() {
        let (a, _) = source("first", None);
        let chain = TokenDiscovery::with_sources(Platform::GitLab, vec![a]);
        assert!(chain
            .discover(&Domain::default_for(Platform::GitLab))
            .unwrap()
            .is_none());
    }

    #[test]
    fn unexpected_error_propagates() {
        let (a, _) = source("first", None);
        let chain =
            TokenDiscovery::with_sources(Platform::GitLab, vec![a, Box::new(FailingSource)]);
        assert!(chain.discover(&Domain::default_for(Platform::GitLab)).is_err());
    }

    #[test]
    fn possible_providers_lists_every_source() {
        let chain = TokenDiscovery::for_platform(Platform::GitLab);
        let text = chain.possible_providers();
        assert_eq!(
            text,
            "\t1. `GITLAB_TOKEN` environment variable\n\
             \t2. Content of the `~/.gitlab-token` file\n\
             \t3. Current auth token from the `glab` GitLab CLI"
        );
    }
}
