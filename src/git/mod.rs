//! git
//!
//! Single interface for all Git access.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Per-repository settings (git
//! config keys) and remote URLs are read here; no other module imports
//! `git2`. Access is read-only and never shells out to the git CLI.

mod interface;

pub use interface::{Git, GitError};
