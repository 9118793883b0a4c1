//! Remote image pre-verification over HTTP.

use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::debug;

use crate::domain::ports::ImageVerifier;

/// Checks that a URL answers a `HEAD` request with an image or video body.
pub struct HttpImageVerifier {
    client: Client,
}

impl HttpImageVerifier {
    /// Creates a verifier sharing the given client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageVerifier for HttpImageVerifier {
    async fn is_loadable(&self, url: &str) -> bool {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "Image verification request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "Image verification rejected");
            return false;
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        is_media_content_type(content_type)
    }
}

/// Servers that omit the header are given the benefit of the doubt.
fn is_media_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("image/") || mime.starts_with("video/")
}
