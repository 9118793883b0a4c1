//! Flickr search client.

use async_trait::async_trait;
use reqwest::Client;

use super::dto::{FlickrPhoto, FlickrResponse};
use super::{fetch_json, require_key};
use crate::domain::entities::{ApiKey, ImageSize, ProviderKind, SearchOptions};
use crate::domain::errors::ProviderError;
use crate::domain::ports::ProviderClient;

const FLICKR_REST_URL: &str = "https://www.flickr.com/services/rest/";
const FLICKR_STATIC_BASE: &str = "https://live.staticflickr.com";
const FLICKR_INVALID_KEY: u32 = 100;

/// Flickr REST client using `flickr.photos.search`.
pub struct FlickrClient {
    client: Client,
    api_key: Option<ApiKey>,
}

impl FlickrClient {
    /// Creates a client.
    #[must_use]
    pub fn new(client: Client, api_key: Option<ApiKey>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderClient for FlickrClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Flickr
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<String>, ProviderError> {
        let key = require_key(self.kind(), self.api_key.as_ref())?;
        let per_page = options.per_page.to_string();

        let request = self.client.get(FLICKR_REST_URL).query(&[
            ("method", "flickr.photos.search"),
            ("api_key", key.as_str()),
            ("text", keyword),
            ("per_page", per_page.as_str()),
            ("sort", "relevance"),
            ("content_type", "1"),
            ("media", "photos"),
            ("safe_search", "1"),
            ("format", "json"),
            ("nojsoncallback", "1"),
        ]);

        let response: FlickrResponse = fetch_json(self.kind(), request).await?;
        image_urls(response, options.size)
    }
}

/// Flickr reports failures inside a 200 response.
fn image_urls(response: FlickrResponse, size: ImageSize) -> Result<Vec<String>, ProviderError> {
    let kind = ProviderKind::Flickr;
    if response.stat != "ok" {
        return Err(match response.code {
            Some(FLICKR_INVALID_KEY) => ProviderError::Unauthorized { provider: kind },
            _ => ProviderError::parse(
                kind,
                response.message.unwrap_or_else(|| format!("stat={}", response.stat)),
            ),
        });
    }

    let photos = response
        .photos
        .ok_or_else(|| ProviderError::parse(kind, "missing photos"))?;

    Ok(photos
        .photo
        .iter()
        .map(|photo| static_url(photo, size))
        .collect())
}

fn static_url(photo: &FlickrPhoto, size: ImageSize) -> String {
    let suffix = match size {
        ImageSize::Small => "z",
        ImageSize::Medium => "c",
        ImageSize::Large => "b",
    };
    format!(
        "{FLICKR_STATIC_BASE}/{}/{}_{}_{suffix}.jpg",
        photo.server, photo.id, photo.secret
    )
}
