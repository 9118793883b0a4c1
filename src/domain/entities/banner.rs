//! Banner specification derived from document metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{BannerSettings, DocumentPath};

/// Front-matter style key/value map of one document.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Default horizontal and vertical anchor, in percent.
pub const DEFAULT_ANCHOR: f32 = 50.0;

/// Default pixel offset at which document content starts below the banner.
pub const DEFAULT_CONTENT_START: u32 = 150;

/// Anchor of the banner image inside its frame, in percent (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BannerPosition {
    /// Horizontal anchor.
    pub x: f32,
    /// Vertical anchor.
    pub y: f32,
}

impl BannerPosition {
    /// Creates a position, clamping both axes to 0..=100.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }
}

impl Default for BannerPosition {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR, DEFAULT_ANCHOR)
    }
}

fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        DEFAULT_ANCHOR
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Declared banner intent for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerSpec {
    input: String,
    shuffle_folder: Option<String>,
    position: BannerPosition,
    content_start: u32,
    icon: Option<String>,
}

impl BannerSpec {
    /// Creates a spec for a raw input with default placement.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into().trim().to_string(),
            shuffle_folder: None,
            position: BannerPosition::default(),
            content_start: DEFAULT_CONTENT_START,
            icon: None,
        }
    }

    /// Draws a random image from a vault folder on every full update.
    #[must_use]
    pub fn with_shuffle_folder(mut self, folder: impl Into<String>) -> Self {
        let folder = folder.into().trim().trim_matches('/').to_string();
        self.shuffle_folder = Some(folder);
        self
    }

    /// Sets the image anchor.
    #[must_use]
    pub const fn with_position(mut self, position: BannerPosition) -> Self {
        self.position = position;
        self
    }

    /// Sets the content start offset.
    #[must_use]
    pub const fn with_content_start(mut self, content_start: u32) -> Self {
        self.content_start = content_start;
        self
    }

    /// Sets the icon overlay glyph.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        let icon = icon.into();
        self.icon = (!icon.trim().is_empty()).then(|| icon.trim().to_string());
        self
    }

    /// Returns the raw input string.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the shuffle folder, if any.
    #[must_use]
    pub fn shuffle_folder(&self) -> Option<&str> {
        self.shuffle_folder.as_deref()
    }

    /// Returns true if the banner rotates on every full update.
    #[must_use]
    pub const fn is_shuffled(&self) -> bool {
        self.shuffle_folder.is_some()
    }

    /// Returns the image anchor.
    #[must_use]
    pub const fn position(&self) -> BannerPosition {
        self.position
    }

    /// Returns the content start offset in pixels.
    #[must_use]
    pub const fn content_start(&self) -> u32 {
        self.content_start
    }

    /// Returns the icon overlay glyph.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Builds the spec for a document from its metadata, falling back to the
    /// most specific folder default. Returns `None` when no banner applies.
    #[must_use]
    pub fn from_metadata(
        document: &DocumentPath,
        metadata: Option<&Metadata>,
        settings: &BannerSettings,
    ) -> Option<Self> {
        let fields = &settings.field_names;
        let lookup = |names: &[String]| metadata.and_then(|m| first_value(m, names));

        let input = lookup(&fields.banner).and_then(read_string);
        let shuffle = lookup(&fields.shuffle).and_then(read_string);
        let folder = settings.folder_default_for(document);

        let mut spec = match (input, shuffle) {
            (None, None) => {
                let folder = folder?;
                let mut spec = Self::new(folder.image.clone());
                if let Some(shuffle) = &folder.shuffle_folder {
                    spec = spec.with_shuffle_folder(shuffle.clone());
                }
                spec
            }
            (input, shuffle) => {
                let mut spec = Self::new(input.unwrap_or_default());
                if let Some(shuffle) = shuffle {
                    spec = spec.with_shuffle_folder(shuffle);
                }
                spec
            }
        };

        if spec.input.is_empty() && spec.shuffle_folder.as_deref().is_none_or(str::is_empty) {
            return None;
        }

        let x = lookup(&fields.x)
            .and_then(read_number)
            .or_else(|| folder.and_then(|f| f.x))
            .unwrap_or(DEFAULT_ANCHOR);
        let y = lookup(&fields.y)
            .and_then(read_number)
            .or_else(|| folder.and_then(|f| f.y))
            .unwrap_or(DEFAULT_ANCHOR);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let content_start = lookup(&fields.content_start)
            .and_then(read_number)
            .map(|v| v.max(0.0) as u32)
            .or_else(|| folder.and_then(|f| f.content_start))
            .unwrap_or(DEFAULT_CONTENT_START);

        spec = spec
            .with_position(BannerPosition::new(x, y))
            .with_content_start(content_start);

        if let Some(icon) = lookup(&fields.icon)
            .and_then(read_string)
            .or_else(|| folder.and_then(|f| f.icon.clone()))
        {
            spec = spec.with_icon(icon);
        }

        Some(spec)
    }
}

fn first_value<'a>(metadata: &'a Metadata, names: &[String]) -> Option<&'a serde_json::Value> {
    names.iter().find_map(|name| metadata.get(name))
}

/// Reads a string field. A bare `[[link]]` in front matter arrives as a
/// single-element list nested in a single-element list.
fn read_string(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(outer) if outer.len() == 1 => match &outer[0] {
            Value::Array(inner) if inner.len() == 1 => {
                let target = inner[0].as_str()?.trim();
                format!("[[{target}]]")
            }
            Value::String(s) => s.trim().to_string(),
            _ => return None,
        },
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

#[allow(clippy::cast_possible_truncation)]
fn read_number(value: &serde_json::Value) -> Option<f32> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
        serde_json::Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim_end_matches("px")
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}
