//! Banner state cache keys and entries.

use std::borrow::Cow;

use tokio::time::Instant;

use super::{BannerSpec, DocumentPath, LeafId, ResolvedBanner};

const SEPARATOR: &str = "::";
const PINNED: &str = "pinned";
const SHUFFLED: &str = "shuffled";

/// Key of one cache entry: `(document, view, shuffle variant)`.
///
/// Path and leaf id are percent-encoded, so the separator never occurs inside
/// a component and the document can be recovered from the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Computes the key for a document shown in a view.
    #[must_use]
    pub fn compute(document: &DocumentPath, leaf: &LeafId, is_shuffled: bool) -> Self {
        let variant = if is_shuffled { SHUFFLED } else { PINNED };
        Self(format!(
            "{}{SEPARATOR}{}{SEPARATOR}{variant}",
            urlencoding::encode(document.as_str()),
            urlencoding::encode(leaf.as_str()),
        ))
    }

    /// Prefix shared by every key of a document.
    #[must_use]
    pub fn document_prefix(document: &DocumentPath) -> String {
        format!("{}{SEPARATOR}", urlencoding::encode(document.as_str()))
    }

    /// Returns true if the key was computed for exactly this document.
    #[must_use]
    pub fn belongs_to(&self, document: &DocumentPath) -> bool {
        self.0.starts_with(&Self::document_prefix(document))
    }

    /// Decodes the document component. Returns `None` for malformed keys.
    #[must_use]
    pub fn document(&self) -> Option<DocumentPath> {
        let (encoded, _) = self.0.split_once(SEPARATOR)?;
        urlencoding::decode(encoded)
            .ok()
            .map(Cow::into_owned)
            .map(DocumentPath::new)
    }

    /// Returns the encoded key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Icon overlay attached alongside a banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconState {
    /// Emoji or short text shown over the banner.
    pub glyph: String,
    /// Persistent overlays outlive re-renders and must be removed on eviction.
    pub persistent: bool,
}

impl IconState {
    /// Creates a persistent overlay.
    #[must_use]
    pub fn persistent(glyph: impl Into<String>) -> Self {
        Self {
            glyph: glyph.into(),
            persistent: true,
        }
    }
}

/// Outcome recorded for a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerState {
    /// A banner was resolved.
    Resolved(ResolvedBanner),
    /// Resolution produced nothing; the banner stays hidden.
    Missing,
}

impl BannerState {
    /// Returns the resolved banner, if any.
    #[must_use]
    pub const fn banner(&self) -> Option<&ResolvedBanner> {
        match self {
            Self::Resolved(banner) => Some(banner),
            Self::Missing => None,
        }
    }

    /// Returns the object URL held by this state.
    #[must_use]
    pub fn object_url(&self) -> Option<&str> {
        self.banner().and_then(ResolvedBanner::object_url)
    }
}

impl From<Option<ResolvedBanner>> for BannerState {
    fn from(value: Option<ResolvedBanner>) -> Self {
        value.map_or(Self::Missing, Self::Resolved)
    }
}

/// Last resolved banner for one `(document, view, variant)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Key this entry is stored under.
    pub key: CacheKey,
    /// Creation time.
    pub timestamp: Instant,
    /// Owning view.
    pub leaf_id: LeafId,
    /// Shuffled entries expire sooner.
    pub is_shuffled: bool,
    /// Resolved banner or recorded miss.
    pub state: BannerState,
    /// Icon overlay, if the spec declared one.
    pub icon_state: Option<IconState>,
    /// Spec the state was resolved from; `None` when no banner applies.
    pub spec: Option<BannerSpec>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        document: &DocumentPath,
        leaf_id: LeafId,
        spec: Option<BannerSpec>,
        state: BannerState,
    ) -> Self {
        let is_shuffled = spec.as_ref().is_some_and(BannerSpec::is_shuffled);
        let icon_state = spec
            .as_ref()
            .and_then(BannerSpec::icon)
            .map(IconState::persistent);

        Self {
            key: CacheKey::compute(document, &leaf_id, is_shuffled),
            timestamp: Instant::now(),
            leaf_id,
            is_shuffled,
            state,
            icon_state,
            spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case("notes/a.md", "L1" ; "simple")]
    #[test_case("my notes/day one.md", "leaf 7" ; "whitespace")]
    #[test_case("a::b/c.md", "x::y" ; "separator_inside")]
    #[test_case("ünïcödé/日記.md", "L1" ; "unicode")]
    fn test_key_is_deterministic_and_decodable(path: &str, leaf: &str) {
        let doc = DocumentPath::new(path);
        let leaf = LeafId::new(leaf);

        let first = CacheKey::compute(&doc, &leaf, false);
        let second = CacheKey::compute(&doc, &leaf, false);

        assert_eq!(first, second);
        assert_eq!(first.document(), Some(doc.clone()));
        assert!(first.belongs_to(&doc));
    }

    #[test]
    fn test_keys_never_collide() {
        let paths = ["a.md", "a.md::L1", "a", "a/b.md", "a b.md", "a%20b.md", ""];
        let leaves = ["L1", "L2", "::", "L1::pinned", ""];

        let mut seen = HashSet::new();
        for path in paths {
            for leaf in leaves {
                for shuffled in [false, true] {
                    let key = CacheKey::compute(&DocumentPath::new(path), &LeafId::new(leaf), shuffled);
                    assert!(seen.insert(key), "collision for {path:?} {leaf:?} {shuffled}");
                }
            }
        }
    }

    #[test]
    fn test_shuffle_flag_changes_key() {
        let doc = DocumentPath::new("a.md");
        let leaf = LeafId::new("L1");
        assert_ne!(
            CacheKey::compute(&doc, &leaf, false),
            CacheKey::compute(&doc, &leaf, true)
        );
    }

    #[test]
    fn test_similar_paths_do_not_match() {
        let key = CacheKey::compute(&DocumentPath::new("notes/a.md.bak"), &LeafId::new("L1"), false);
        assert!(!key.belongs_to(&DocumentPath::new("notes/a.md")));

        let key = CacheKey::compute(&DocumentPath::new("notes/a.md"), &LeafId::new("L1"), false);
        assert!(!key.belongs_to(&DocumentPath::new("notes/a")));
    }

    #[test]
    fn test_entry_derives_variant_and_icon_from_spec() {
        let doc = DocumentPath::new("a.md");
        let spec = BannerSpec::new("").with_shuffle_folder("walls").with_icon("🔥");

        let entry = CacheEntry::new(&doc, LeafId::new("L1"), Some(spec), BannerState::Missing);

        assert!(entry.is_shuffled);
        assert_eq!(entry.key, CacheKey::compute(&doc, &LeafId::new("L1"), true));
        assert_eq!(entry.icon_state, Some(IconState::persistent("🔥")));
    }
}
