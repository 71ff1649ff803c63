//! core
//!
//! Settings shared by every command.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading

pub mod config;
