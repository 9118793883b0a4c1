//! Unsplash search client.

use async_trait::async_trait;
use reqwest::{Client, header};

use super::dto::UnsplashResponse;
use super::{fetch_json, require_key};
use crate::domain::entities::{ApiKey, ImageSize, Orientation, ProviderKind, SearchOptions};
use crate::domain::errors::ProviderError;
use crate::domain::ports::ProviderClient;

const UNSPLASH_API_BASE: &str = "https://api.unsplash.com";
const UNSPLASH_MAX_PER_PAGE: u32 = 30;

/// Unsplash API client authenticating with a `Client-ID` access key.
pub struct UnsplashClient {
    client: Client,
    api_key: Option<ApiKey>,
}

impl UnsplashClient {
    /// Creates a client.
    #[must_use]
    pub fn new(client: Client, api_key: Option<ApiKey>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderClient for UnsplashClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Unsplash
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
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "squarish",
        };
        let per_page = options.per_page.clamp(1, UNSPLASH_MAX_PER_PAGE).to_string();

        let request = self
            .client
            .get(format!("{UNSPLASH_API_BASE}/search/photos"))
            .header(header::AUTHORIZATION, format!("Client-ID {}", key.as_str()))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", keyword),
                ("per_page", per_page.as_str()),
                ("orientation", orientation),
                ("content_filter", "high"),
            ]);

        let response: UnsplashResponse = fetch_json(self.kind(), request).await?;
        Ok(image_urls(response, options.size))
    }
}

fn image_urls(response: UnsplashResponse, size: ImageSize) -> Vec<String> {
    response
        .results
        .into_iter()
        .filter_map(|photo| {
            let urls = photo.urls;
            match size {
                ImageSize::Small => urls.small.or(urls.regular),
                ImageSize::Medium => urls.regular.or(urls.full),
                ImageSize::Large => urls.full.or(urls.regular),
            }
        })
        .collect()
}
