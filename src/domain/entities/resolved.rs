//! Result of a banner resolution.

use serde::{Deserialize, Serialize};

/// URL scheme of in-memory blob URLs.
pub const OBJECT_URL_SCHEME: &str = "blob:";

/// Where a resolved banner came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Direct URL.
    Url,
    /// Vault-relative path.
    VaultPath,
    /// Wiki-style link.
    WikiLink,
    /// Provider keyword search.
    Keyword,
}

/// A banner ready to be committed to a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBanner {
    /// Object URL, resource URL or remote URL.
    pub image_url: String,
    /// Video assets are streamed instead of buffered.
    pub is_video: bool,
    /// Provenance.
    pub source_kind: SourceKind,
}

impl ResolvedBanner {
    /// Creates a resolved banner.
    #[must_use]
    pub fn new(image_url: impl Into<String>, is_video: bool, source_kind: SourceKind) -> Self {
        Self {
            image_url: image_url.into(),
            is_video,
            source_kind,
        }
    }

    /// Returns the object URL this banner holds, if it holds one.
    #[must_use]
    pub fn object_url(&self) -> Option<&str> {
        self.image_url
            .starts_with(OBJECT_URL_SCHEME)
            .then_some(self.image_url.as_str())
    }
}
