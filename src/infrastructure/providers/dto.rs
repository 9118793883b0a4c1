//! Provider search response payloads.

use serde::Deserialize;

/// Pexels `/v1/search` response.
#[derive(Debug, Deserialize)]
pub struct PexelsResponse {
    /// Matching photos.
    #[serde(default)]
    pub photos: Vec<PexelsPhoto>,
}

/// One Pexels photo.
#[derive(Debug, Deserialize)]
pub struct PexelsPhoto {
    /// Pre-sized renditions.
    pub src: PexelsSources,
}

/// Pexels renditions, smallest to largest.
#[derive(Debug, Deserialize)]
pub struct PexelsSources {
    pub medium: Option<String>,
    pub large: Option<String>,
    pub large2x: Option<String>,
    pub original: Option<String>,
}

/// Pixabay `/api/` response.
#[derive(Debug, Deserialize)]
pub struct PixabayResponse {
    /// Matching images.
    #[serde(default)]
    pub hits: Vec<PixabayHit>,
}

/// One Pixabay image.
#[derive(Debug, Deserialize)]
pub struct PixabayHit {
    /// 640px rendition.
    #[serde(rename = "webformatURL")]
    pub webformat_url: Option<String>,
    /// 1280px rendition.
    #[serde(rename = "largeImageURL")]
    pub large_image_url: Option<String>,
}

/// Flickr REST response envelope.
#[derive(Debug, Deserialize)]
pub struct FlickrResponse {
    /// `ok` or `fail`.
    pub stat: String,
    /// Present when `stat` is `ok`.
    pub photos: Option<FlickrPhotos>,
    /// Error code when `stat` is `fail`.
    pub code: Option<u32>,
    /// Error message when `stat` is `fail`.
    pub message: Option<String>,
}

/// One page of Flickr results.
#[derive(Debug, Deserialize)]
pub struct FlickrPhotos {
    #[serde(default)]
    pub photo: Vec<FlickrPhoto>,
}

/// Identifiers needed to build a Flickr static image URL.
#[derive(Debug, Deserialize)]
pub struct FlickrPhoto {
    pub id: String,
    pub secret: String,
    pub server: String,
}

/// Unsplash `/search/photos` response.
#[derive(Debug, Deserialize)]
pub struct UnsplashResponse {
    /// Matching photos.
    #[serde(default)]
    pub results: Vec<UnsplashPhoto>,
}

/// One Unsplash photo.
#[derive(Debug, Deserialize)]
pub struct UnsplashPhoto {
    pub urls: UnsplashUrls,
}

/// Unsplash renditions.
#[derive(Debug, Deserialize)]
pub struct UnsplashUrls {
    pub small: Option<String>,
    pub regular: Option<String>,
    pub full: Option<String>,
}
