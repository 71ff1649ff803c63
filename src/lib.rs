//! forgelink - Unified access to GitHub and GitLab
//!
//! forgelink finds an access token the way a developer already
//! authenticates (environment variable, token file, or the platform's
//! official CLI) and uses it to talk to the GitHub or GitLab REST and
//! GraphQL APIs, including GitHub Enterprise and self-managed GitLab.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to handlers)
//! - [`forge`] - Platform identity, request executor, and provider clients
//! - [`auth`] - Access token discovery chain
//! - [`core`] - Configuration schema and loading
//! - [`git`] - Single interface for all Git access
//! - [`ui`] - User-facing output
//!
//! # Guarantees
//!
//! 1. Token values never appear in output, logs, or errors
//! 2. Every failure carries a message that says what to do next
//! 3. Pagination and redirect repair are bounded

pub mod auth;
pub mod cli;
pub mod core;
pub mod forge;
pub mod git;
pub mod ui;
