//! forge
//!
//! Unified access to code-hosting platforms (GitHub, GitLab).
//!
//! # Architecture
//!
//! The [`Forge`] trait defines the operations callers need. Commands use the
//! [`create_forge`] factory rather than importing provider clients
//! directly.
//!
//! - Platform identity ([`Platform`], [`Domain`]) is pure data
//! - Provider clients are thin; all HTTP mechanics live in [`ApiClient`]
//! - Failures are [`ForgeError`]s with ready-to-print messages; non-fatal
//!   notices are [`ForgeWarning`]s attached to successful results
//!
//! # Modules
//!
//! - `platform`: Platform tag and domain resolution
//! - `project`: Repository addressing
//! - `traits`: Core `Forge` trait and request/response types
//! - `executor`: Authenticated request executor
//! - [`github`]: GitHub client
//! - [`gitlab`]: GitLab client
//! - `factory`: Settings resolution and client creation
//!
//! # Example
//!
//! ```ignore
//! use forgelink::forge::{create_forge, CreatePrRequest, ForgeOptions, Platform};
//!
//! let forge = create_forge(Platform::GitHub, &config, Some(&git), &ForgeOptions::default())?;
//! let pr = forge.create_pull_request(CreatePrRequest {
//!     head: "feature".to_string(),
//!     base: "main".to_string(),
//!     title: "Add feature".to_string(),
//!     description: None,
//!     draft: false,
//! }).await?;
//!
//! println!("Created #{}: {}", pr.number, pr.url);
//! ```

mod executor;
mod factory;
pub mod github;
pub mod gitlab;
mod platform;
mod project;
mod traits;

pub use executor::{
    next_page_url_from_link, repository_id_from_location, validation_message, ApiClient,
    ApiResponse, MAX_PAGES, MAX_REDIRECT_REPAIRS,
};
pub use factory::{build_forge, create_forge, ForgeOptions, ForgeSettings, DEFAULT_REMOTE};
pub use platform::{Domain, HelperCli, Platform, GRAPHQL_PATH};
pub use project::{Namespace, ProjectRef, MAX_NAMESPACE_DEPTH};
pub use traits::*;
