//! Image pre-verification port definition.

use async_trait::async_trait;

/// Checks that a remote image can actually be loaded.
#[async_trait]
pub trait ImageVerifier: Send + Sync {
    /// Returns true if the URL serves an image.
    async fn is_loadable(&self, url: &str) -> bool;
}
