//! Banner behavior settings supplied by the host's settings layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DocumentPath, SearchOptions};

/// Metadata field names read for each banner property. Earlier names win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    /// Banner input field.
    #[serde(default = "default_banner_fields")]
    pub banner: Vec<String>,
    /// Horizontal anchor field.
    #[serde(default = "default_x_fields")]
    pub x: Vec<String>,
    /// Vertical anchor field.
    #[serde(default = "default_y_fields")]
    pub y: Vec<String>,
    /// Content start offset field.
    #[serde(default = "default_content_start_fields")]
    pub content_start: Vec<String>,
    /// Shuffle folder field.
    #[serde(default = "default_shuffle_fields")]
    pub shuffle: Vec<String>,
    /// Icon overlay field.
    #[serde(default = "default_icon_fields")]
    pub icon: Vec<String>,
}

fn default_banner_fields() -> Vec<String> {
    vec!["banner".to_string()]
}

fn default_x_fields() -> Vec<String> {
    vec!["banner-x".to_string()]
}

fn default_y_fields() -> Vec<String> {
    vec!["banner-y".to_string()]
}

fn default_content_start_fields() -> Vec<String> {
    vec!["content-start".to_string()]
}

fn default_shuffle_fields() -> Vec<String> {
    vec!["banner-shuffle".to_string()]
}

fn default_icon_fields() -> Vec<String> {
    vec!["icon".to_string()]
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            banner: default_banner_fields(),
            x: default_x_fields(),
            y: default_y_fields(),
            content_start: default_content_start_fields(),
            shuffle: default_shuffle_fields(),
            icon: default_icon_fields(),
        }
    }
}

/// Banner applied to every document in a folder that declares none itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderBanner {
    /// Vault-relative folder; empty means the whole vault.
    pub folder: String,
    /// Banner input used for documents in the folder.
    #[serde(default)]
    pub image: String,
    /// Folder to draw a random image from instead of `image`.
    #[serde(default)]
    pub shuffle_folder: Option<String>,
    /// Horizontal anchor override.
    #[serde(default)]
    pub x: Option<f32>,
    /// Vertical anchor override.
    #[serde(default)]
    pub y: Option<f32>,
    /// Content start override.
    #[serde(default)]
    pub content_start: Option<u32>,
    /// Icon overlay.
    #[serde(default)]
    pub icon: Option<String>,
    /// Only documents directly inside the folder qualify.
    #[serde(default)]
    pub direct_children_only: bool,
}

impl FolderBanner {
    fn normalized_folder(&self) -> &str {
        self.folder.trim().trim_matches('/')
    }

    /// Returns true if the document falls under this folder default.
    #[must_use]
    pub fn matches(&self, document: &DocumentPath) -> bool {
        let folder = self.normalized_folder();
        let parent = document.parent();

        if self.direct_children_only {
            return parent == folder;
        }

        folder.is_empty()
            || parent == folder
            || parent
                .strip_prefix(folder)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Age and size bounds of the banner state cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Maximum age of a pinned entry, in seconds.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    /// Maximum age of a shuffled entry, in seconds.
    #[serde(default = "default_shuffled_max_age_secs")]
    pub shuffled_max_age_secs: u64,
    /// Maximum number of entries kept.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_age_secs() -> u64 {
    30 * 60
}

fn default_shuffled_max_age_secs() -> u64 {
    5 * 60
}

fn default_max_entries() -> usize {
    30
}

impl CachePolicy {
    /// Raises zero bounds to the smallest usable value: one entry, one second.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            max_age_secs: self.max_age_secs.max(1),
            shuffled_max_age_secs: self.shuffled_max_age_secs.max(1),
            max_entries: self.max_entries.max(1),
        }
    }

    /// Maximum age of a pinned entry, never below one second.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs.max(1))
    }

    /// Maximum age of a shuffled entry. Always strictly below [`Self::max_age`];
    /// a configured value that is not is halved down from the pinned age.
    #[must_use]
    pub fn shuffled_max_age(&self) -> Duration {
        let shuffled = Duration::from_secs(self.shuffled_max_age_secs.max(1));
        if shuffled < self.max_age() {
            shuffled
        } else {
            self.max_age() / 2
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            shuffled_max_age_secs: default_shuffled_max_age_secs(),
            max_entries: default_max_entries(),
        }
    }
}

/// Banner resolution and caching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerSettings {
    /// Metadata field names.
    #[serde(default)]
    pub field_names: FieldNames,

    /// Generic keywords tried once per provider when the primary keyword fails.
    #[serde(default = "default_fallback_keywords")]
    pub fallback_keywords: Vec<String>,

    /// Provider search options.
    #[serde(default)]
    pub search: SearchOptions,

    /// Check that a provider image is loadable before using it.
    #[serde(default = "default_true")]
    pub verify_images: bool,

    /// Cache bounds.
    #[serde(default)]
    pub cache: CachePolicy,

    /// Minimum spacing between provider requests, in milliseconds.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Coalescing window for layout events, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Capacity of the keyword to image URL memo.
    #[serde(default = "default_keyword_memo_size")]
    pub keyword_memo_size: usize,

    /// Per-folder default banners.
    #[serde(default)]
    pub folder_defaults: Vec<FolderBanner>,
}

fn default_fallback_keywords() -> Vec<String> {
    [
        "nature",
        "abstract",
        "landscape",
        "architecture",
        "ocean",
        "mountains",
        "forest",
        "space",
        "cityscape",
        "minimal",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_keyword_memo_size() -> usize {
    100
}

impl BannerSettings {
    /// Minimum spacing between provider requests.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Coalescing window for layout events.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Returns the most specific folder default covering the document.
    #[must_use]
    pub fn folder_default_for(&self, document: &DocumentPath) -> Option<&FolderBanner> {
        self.folder_defaults
            .iter()
            .filter(|f| f.matches(document))
            .max_by_key(|f| f.normalized_folder().len())
    }
}

impl Default for BannerSettings {
    fn default() -> Self {
        Self {
            field_names: FieldNames::default(),
            fallback_keywords: default_fallback_keywords(),
            search: SearchOptions::default(),
            verify_images: true,
            cache: CachePolicy::default(),
            rate_limit_ms: default_rate_limit_ms(),
            debounce_ms: default_debounce_ms(),
            keyword_memo_size: default_keyword_memo_size(),
            folder_defaults: Vec::new(),
        }
    }
}
