//! In-memory object URL registry.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::trace;
use uuid::Uuid;

use crate::domain::entities::OBJECT_URL_SCHEME;
use crate::domain::ports::ObjectUrlRegistry;

const URL_ORIGIN: &str = "notebanner";

/// One registered blob.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Content.
    pub bytes: Bytes,
    /// MIME type given at creation.
    pub mime: String,
}

/// Holds blob content until its URL is revoked.
#[derive(Debug, Default)]
pub struct BlobStore {
    blobs: RwLock<HashMap<String, Blob>>,
}

impl BlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the blob behind a live URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Blob> {
        self.blobs.read().get(url).cloned()
    }

    /// Returns the number of live URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if no URL is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl ObjectUrlRegistry for BlobStore {
    fn create(&self, bytes: Bytes, mime: &str) -> String {
        let url = format!("{OBJECT_URL_SCHEME}{URL_ORIGIN}/{}", Uuid::new_v4());
        trace!(url, mime, size = bytes.len(), "Created object URL");
        self.blobs.write().insert(
            url.clone(),
            Blob {
                bytes,
                mime: mime.to_string(),
            },
        );
        url
    }

    fn revoke(&self, url: &str) -> bool {
        let removed = self.blobs.write().remove(url).is_some();
        trace!(url, removed, "Revoked object URL");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_revoke() {
        let store = BlobStore::new();
        let url = store.create(Bytes::from_static(b"\x89PNG"), "image/png");

        assert!(url.starts_with("blob:notebanner/"));
        assert_eq!(store.get(&url).map(|b| b.mime), Some("image/png".to_string()));
        assert_eq!(store.len(), 1);

        assert!(store.revoke(&url));
        assert!(!store.revoke(&url));
        assert!(store.is_empty());
    }

    #[test]
    fn test_urls_are_unique() {
        let store = BlobStore::new();
        let a = store.create(Bytes::new(), "image/png");
        let b = store.create(Bytes::new(), "image/png");

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unknown_url_is_tolerated() {
        assert!(!BlobStore::new().revoke("blob:elsewhere/1"));
    }
}
