//! Vault file access.

mod fs_store;

pub use fs_store::FsVault;
