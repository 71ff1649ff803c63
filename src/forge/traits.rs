//! forge::traits
//!
//! Forge trait definition and the provider-neutral types it exchanges.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` with a [`ForgeError`] whose message is ready
//! to print: callers never inspect HTTP status codes themselves.
//!
//! # Example
//!
//! ```ignore
//! use forgelink::forge::{Forge, CreatePrRequest};
//!
//! async fn submit(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let pr = forge.create_pull_request(CreatePrRequest {
//!         head: "feature-branch".to_string(),
//!         base: "main".to_string(),
//!         title: "Add feature".to_string(),
//!         description: Some("Description".to_string()),
//!         draft: false,
//!     }).await?;
//!     println!("Created #{}: {}", pr.number, pr.url);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use super::platform::Domain;

/// Errors from forge operations.
///
/// Every variant carries a message meant to be shown to the user verbatim;
/// most contain next-step guidance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// The platform rejected the request as semantically invalid (HTTP 422).
    #[error("{0}")]
    Validation(String),

    /// The token is missing, invalid, or lacks permissions (HTTP 401/403).
    #[error("{0}")]
    Auth(String),

    /// The resource was not found (HTTP 404); usually a token problem.
    #[error("{0}")]
    NotFound(String),

    /// Any other HTTP failure, or output that a well-behaved platform or
    /// helper tool never produces.
    #[error("{0}")]
    Unexpected(String),

    /// The request never reached the platform.
    #[error("could not connect to {host}: {message}")]
    Connection {
        /// Host the request was sent to
        host: String,
        /// Transport error description
        message: String,
    },

    /// The repository reference is insufficient to build a URL.
    #[error("{0}")]
    Addressing(String),
}

/// Non-fatal notices attached to a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgeWarning {
    /// The repository was renamed or moved; the request was repaired.
    RepositoryMoved {
        /// Path that triggered the redirect
        from: String,
        /// New `owner/name` of the repository
        to: String,
        /// Suggested new remote URL
        new_url: String,
    },
}

impl std::fmt::Display for ForgeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForgeWarning::RepositoryMoved { from, to, new_url } => write!(
                f,
                "The repository behind `{}` has been renamed or moved to `{}`.\n\
                 Please update your remote, e.g. `git remote set-url origin {}`",
                from, to, new_url
            ),
        }
    }
}

/// Request to create a pull/merge request.
#[derive(Debug, Clone)]
pub struct CreatePrRequest {
    /// Head branch name (the branch with changes)
    pub head: String,
    /// Base branch name (the branch to merge into)
    pub base: String,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Create as draft
    pub draft: bool,
}

/// Pull/merge request information returned from the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number (GitLab: project-scoped iid)
    pub number: u64,
    /// Web URL
    pub url: String,
    /// State
    pub state: PrState,
    /// Whether the request is a draft
    pub is_draft: bool,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Login of the author
    pub author: String,
}

/// PR state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    /// Open and awaiting review/merge
    Open,
    /// Closed without being merged
    Closed,
    /// Merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
            PrState::Merged => write!(f, "merged"),
        }
    }
}

/// The Forge trait for interacting with code-hosting platforms.
///
/// Implementations are thin: each operation is one executor call (or a
/// small fixed sequence of calls) plus JSON field extraction.
///
/// # Errors
///
/// All methods return `Result<T, ForgeError>`:
/// - `Addressing`: the repository reference is incomplete (no request sent)
/// - `Auth` / `NotFound`: missing or insufficient token
/// - `Validation`: the platform rejected the request
/// - `Connection`: check connectivity
/// - `Unexpected`: anything else
#[async_trait]
pub trait Forge: Send + Sync {
    /// Forge name (e.g., "github", "gitlab").
    fn name(&self) -> &'static str;

    /// Domain this forge talks to.
    fn domain(&self) -> &Domain;

    /// Login of the user owning the token, or `None` without a token.
    async fn current_user_login(&self) -> Result<Option<String>, ForgeError>;

    /// Open a new pull/merge request.
    async fn create_pull_request(&self, request: CreatePrRequest)
        -> Result<PullRequest, ForgeError>;

    /// Get a pull/merge request by number.
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError>;

    /// All open pull/merge requests, across every page.
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError>;

    /// Change the base branch of a pull/merge request.
    async fn retarget_pull_request(
        &self,
        number: u64,
        base: &str,
    ) -> Result<PullRequest, ForgeError>;

    /// Default description template stored in the repository, if any.
    async fn description_template(&self) -> Result<Option<String>, ForgeError>;
}
