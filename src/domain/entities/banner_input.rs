//! Classification of raw banner inputs.

use std::sync::OnceLock;

use regex::Regex;

/// File extensions accepted as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "avif"];

/// File extensions accepted as video banners. These stream from a resource URL.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv"];

/// What a raw banner string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerInput {
    /// Absolute `http`, `https` or `file` URL.
    Url(String),
    /// Existing vault file with an accepted extension.
    VaultPath(String),
    /// Wiki-style `[[link]]` target, without alias or heading.
    WikiLink(String),
    /// Anything else is a search keyword.
    Keyword(String),
}

impl BannerInput {
    /// Classifies a raw banner string.
    ///
    /// `vault_file_exists` is asked only for inputs that carry an accepted
    /// media extension. Returns `None` for blank input.
    pub fn classify(raw: &str, vault_file_exists: impl Fn(&str) -> bool) -> Option<Self> {
        let input = strip_quotes(raw.trim());
        if input.is_empty() {
            return None;
        }

        if is_absolute_url(input) {
            return Some(Self::Url(input.to_string()));
        }

        if let Some(target) = wiki_link_target(input) {
            return Some(Self::WikiLink(target));
        }

        let path = input.trim_start_matches('/');
        if is_accepted_media(path) && vault_file_exists(path) {
            return Some(Self::VaultPath(path.to_string()));
        }

        Some(Self::Keyword(input.to_string()))
    }

    /// Returns the classified value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::VaultPath(s) | Self::WikiLink(s) | Self::Keyword(s) => s,
        }
    }
}

fn strip_quotes(input: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = input
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    input
}

fn is_absolute_url(input: &str) -> bool {
    reqwest::Url::parse(input)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https" | "file"))
}

fn wiki_link_target(input: &str) -> Option<String> {
    static WIKI_LINK: OnceLock<Regex> = OnceLock::new();
    let re = WIKI_LINK.get_or_init(|| {
        Regex::new(r"^!?\[\[([^\]|#]+)(?:#[^\]|]*)?(?:\|[^\]]*)?\]\]$").expect("Invalid regex")
    });

    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
}

/// Returns the lowercased extension of a path or URL, ignoring query and fragment.
#[must_use]
pub fn extension_of(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns true if the path names a video asset.
#[must_use]
pub fn is_video_path(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns true if the path names an image or video asset.
#[must_use]
pub fn is_accepted_media(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| {
        IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Guesses a MIME type for an image extension.
#[must_use]
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn exists(path: &str) -> bool {
        path == "assets/sky.png" || path == "clips/intro.mp4"
    }

    #[test_case("https://example.com/a.jpg", BannerInput::Url("https://example.com/a.jpg".into()) ; "https_url")]
    #[test_case("file:///home/me/a.png", BannerInput::Url("file:///home/me/a.png".into()) ; "file_url")]
    #[test_case("[[sky.png]]", BannerInput::WikiLink("sky.png".into()) ; "wiki_link")]
    #[test_case("![[folder/sky.png|banner]]", BannerInput::WikiLink("folder/sky.png".into()) ; "embed_with_alias")]
    #[test_case("[[Note#Heading]]", BannerInput::WikiLink("Note".into()) ; "link_with_heading")]
    #[test_case("assets/sky.png", BannerInput::VaultPath("assets/sky.png".into()) ; "vault_path")]
    #[test_case("/clips/intro.mp4", BannerInput::VaultPath("clips/intro.mp4".into()) ; "vault_video_leading_slash")]
    #[test_case("assets/missing.png", BannerInput::Keyword("assets/missing.png".into()) ; "missing_file_is_keyword")]
    #[test_case("\"mountain lake\"", BannerInput::Keyword("mountain lake".into()) ; "quoted_keyword")]
    #[test_case("nature", BannerInput::Keyword("nature".into()) ; "plain_keyword")]
    #[test_case("mailto:someone@example.com", BannerInput::Keyword("mailto:someone@example.com".into()) ; "unsupported_scheme")]
    fn test_classify(raw: &str, expected: BannerInput) {
        assert_eq!(BannerInput::classify(raw, exists), Some(expected));
    }

    #[test]
    fn test_classify_blank_is_none() {
        assert_eq!(BannerInput::classify("   ", exists), None);
        assert_eq!(BannerInput::classify("\"\"", exists), None);
    }

    #[test]
    fn test_exists_not_consulted_for_plain_keywords() {
        let result = BannerInput::classify("forest", |_| panic!("should not probe the vault"));
        assert_eq!(result, Some(BannerInput::Keyword("forest".into())));
    }

    #[test_case("photo.JPG", Some("jpg") ; "uppercase")]
    #[test_case("https://x.io/v.webm?token=1", Some("webm") ; "query_string")]
    #[test_case(".hidden", None ; "dotfile")]
    #[test_case("folder.d/readme", None ; "dot_in_folder")]
    fn test_extension_of(path: &str, expected: Option<&str>) {
        assert_eq!(extension_of(path).as_deref(), expected);
    }

    #[test]
    fn test_video_detection() {
        assert!(is_video_path("clips/intro.MP4"));
        assert!(!is_video_path("assets/sky.png"));
        assert!(is_accepted_media("assets/sky.png"));
        assert!(!is_accepted_media("notes/readme.md"));
    }
}
