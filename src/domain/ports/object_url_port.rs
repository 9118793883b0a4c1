//! Object URL port definition.

use bytes::Bytes;

/// Allocates and releases in-memory blob URLs.
pub trait ObjectUrlRegistry: Send + Sync {
    /// Wraps bytes in a new `blob:` URL.
    fn create(&self, bytes: Bytes, mime: &str) -> String;

    /// Releases a URL. Returns false if the URL was unknown or already released.
    fn revoke(&self, url: &str) -> bool;
}
