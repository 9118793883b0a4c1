//! Stock-photo provider identifiers and search options.

use serde::{Deserialize, Serialize};

/// Remote image source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// pexels.com
    Pexels,
    /// pixabay.com
    Pixabay,
    /// flickr.com
    Flickr,
    /// unsplash.com
    Unsplash,
}

impl ProviderKind {
    /// All providers in default priority order.
    pub const ALL: [Self; 4] = [Self::Pexels, Self::Pixabay, Self::Flickr, Self::Unsplash];

    /// Environment variable that can supply this provider's API key.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Pexels => "PEXELS_API_KEY",
            Self::Pixabay => "PIXABAY_API_KEY",
            Self::Flickr => "FLICKR_API_KEY",
            Self::Unsplash => "UNSPLASH_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pexels => write!(f, "pexels"),
            Self::Pixabay => write!(f, "pixabay"),
            Self::Flickr => write!(f, "flickr"),
            Self::Unsplash => write!(f, "unsplash"),
        }
    }
}

/// Requested image size class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    /// Small.
    Small,
    /// Medium.
    #[default]
    Medium,
    /// Large.
    Large,
}

/// Requested image orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Wider than tall.
    #[default]
    Landscape,
    /// Taller than wide.
    Portrait,
    /// Roughly square.
    Square,
}

/// Options passed to every provider search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Number of candidates requested per search.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Size class.
    #[serde(default)]
    pub size: ImageSize,
    /// Orientation.
    #[serde(default)]
    pub orientation: Orientation,
}

fn default_per_page() -> u32 {
    10
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            size: ImageSize::default(),
            orientation: Orientation::default(),
        }
    }
}
