//! Pixabay search client.

use async_trait::async_trait;
use reqwest::Client;

use super::dto::PixabayResponse;
use super::{fetch_json, require_key};
use crate::domain::entities::{ApiKey, ImageSize, Orientation, ProviderKind, SearchOptions};
use crate::domain::errors::ProviderError;
use crate::domain::ports::ProviderClient;

const PIXABAY_API_BASE: &str = "https://pixabay.com/api/";
const PIXABAY_MIN_PER_PAGE: u32 = 3;
const PIXABAY_MAX_PER_PAGE: u32 = 200;

/// Pixabay API client. The key goes in the query string.
pub struct PixabayClient {
    client: Client,
    api_key: Option<ApiKey>,
}

impl PixabayClient {
    /// Creates a client against the public API.
    #[must_use]
    pub fn new(client: Client, api_key: Option<ApiKey>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderClient for PixabayClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pixabay
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
        let orientation = match options.orientation {
            Orientation::Landscape => "horizontal",
            Orientation::Portrait => "vertical",
            Orientation::Square => "all",
        };
        let per_page = options
            .per_page
            .clamp(PIXABAY_MIN_PER_PAGE, PIXABAY_MAX_PER_PAGE)
            .to_string();

        let request = self.client.get(PIXABAY_API_BASE).query(&[
            ("key", key.as_str()),
            ("q", keyword),
            ("image_type", "photo"),
            ("orientation", orientation),
            ("safesearch", "true"),
            ("per_page", per_page.as_str()),
        ]);

        let response: PixabayResponse = fetch_json(self.kind(), request).await?;
        Ok(image_urls(response, options.size))
    }
}

fn image_urls(response: PixabayResponse, size: ImageSize) -> Vec<String> {
    response
        .hits
        .into_iter()
        .filter_map(|hit| match size {
            ImageSize::Small => hit.webformat_url.or(hit.large_image_url),
            ImageSize::Medium | ImageSize::Large => hit.large_image_url.or(hit.webformat_url),
        })
        .collect()
}
