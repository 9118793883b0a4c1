//! Notebanner - banner images for notes.
//!
//! This crate keeps a per-view banner state cache with bounded lifetime,
//! resolves banner inputs (URLs, vault files, wiki links and stock-photo
//! keywords) behind a shared rate limiter, and orchestrates which view events
//! reuse, re-resolve or leave a banner alone.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the cache, resolver and orchestrator.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "notebanner";
