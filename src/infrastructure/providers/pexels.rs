//! Pexels search client.

use async_trait::async_trait;
use reqwest::{Client, header};

use super::dto::PexelsResponse;
use super::{fetch_json, require_key};
use crate::domain::entities::{ApiKey, ImageSize, Orientation, ProviderKind, SearchOptions};
use crate::domain::errors::ProviderError;
use crate::domain::ports::ProviderClient;

const PEXELS_API_BASE: &str = "https://api.pexels.com/v1";

/// Pexels API client. The key goes in the `Authorization` header.
pub struct PexelsClient {
    client: Client,
    api_key: Option<ApiKey>,
}

impl PexelsClient {
    /// Creates a client against the public API.
    #[must_use]
    pub fn new(client: Client, api_key: Option<ApiKey>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderClient for PexelsClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pexels
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
            Orientation::Square => "square",
        };

        let per_page = options.per_page.to_string();

        let request = self
            .client
            .get(format!("{PEXELS_API_BASE}/search"))
            .header(header::AUTHORIZATION, key.as_str())
            .query(&[
                ("query", keyword),
                ("per_page", per_page.as_str()),
                ("orientation", orientation),
            ]);

        let response: PexelsResponse = fetch_json(self.kind(), request).await?;
        Ok(image_urls(response, options.size))
    }
}

fn image_urls(response: PexelsResponse, size: ImageSize) -> Vec<String> {
    response
        .photos
        .into_iter()
        .filter_map(|photo| {
            let src = photo.src;
            match size {
                ImageSize::Small => src.medium.or(src.large),
                ImageSize::Medium => src.large.or(src.large2x),
                ImageSize::Large => src.large2x.or(src.original),
            }
        })
        .collect()
}
