//! Infrastructure layer with external service adapters.

/// In-memory object URLs.
pub mod blob_store;
/// Application configuration.
pub mod config;
/// Stock-photo provider clients.
pub mod providers;
/// Random picks.
pub mod random;
/// Vault file access.
pub mod vault;
/// Remote image verification.
pub mod verifier;

pub use blob_store::{Blob, BlobStore};
pub use config::{
    AppConfig, CliArgs, Command, ConfigError, LogLevel, ProvidersConfig, StorageManager,
};
pub use random::FastRandom;
pub use vault::FsVault;
pub use verifier::HttpImageVerifier;
