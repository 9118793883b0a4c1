//! Stock-photo provider HTTP clients.

mod dto;
mod flickr;
mod pexels;
mod pixabay;
mod unsplash;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use flickr::FlickrClient;
pub use pexels::PexelsClient;
pub use pixabay::PixabayClient;
pub use unsplash::UnsplashClient;

use crate::application::ProviderRegistry;
use crate::domain::entities::{ApiKey, ProviderKind};
use crate::domain::errors::ProviderError;
use crate::domain::ports::ProviderClient;

const USER_AGENT: &str = concat!("notebanner/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the HTTP client shared by every provider and the image verifier.
///
/// # Errors
/// Returns error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Creates a client for one provider.
#[must_use]
pub fn provider_client(
    kind: ProviderKind,
    client: Client,
    api_key: Option<ApiKey>,
) -> Arc<dyn ProviderClient> {
    match kind {
        ProviderKind::Pexels => Arc::new(PexelsClient::new(client, api_key)),
        ProviderKind::Pixabay => Arc::new(PixabayClient::new(client, api_key)),
        ProviderKind::Flickr => Arc::new(FlickrClient::new(client, api_key)),
        ProviderKind::Unsplash => Arc::new(UnsplashClient::new(client, api_key)),
    }
}

/// Builds the provider registry in the given priority order. Duplicates after
/// the first occurrence are ignored.
#[must_use]
pub fn build_registry(
    client: &Client,
    priority: &[ProviderKind],
    api_key: impl Fn(ProviderKind) -> Option<ApiKey>,
) -> ProviderRegistry {
    let mut seen = Vec::with_capacity(priority.len());
    let providers = priority
        .iter()
        .copied()
        .filter(|kind| {
            if seen.contains(kind) {
                false
            } else {
                seen.push(*kind);
                true
            }
        })
        .map(|kind| provider_client(kind, client.clone(), api_key(kind)))
        .collect();
    ProviderRegistry::new(providers)
}

fn require_key(kind: ProviderKind, api_key: Option<&ApiKey>) -> Result<&ApiKey, ProviderError> {
    api_key.ok_or(ProviderError::MissingCredential { provider: kind })
}

/// Sends a search request and decodes the JSON body.
async fn fetch_json<T: DeserializeOwned>(
    kind: ProviderKind,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| {
        warn!(provider = %kind, error = %e, "Provider request failed");
        if e.is_timeout() {
            ProviderError::network(kind, "request timed out")
        } else if e.is_connect() {
            ProviderError::network(kind, "failed to connect")
        } else {
            ProviderError::network(kind, e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(status_error(kind, status));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(kind, e.to_string()))?;
    debug!(provider = %kind, bytes = body.len(), "Provider responded");

    serde_json::from_str(&body).map_err(|e| ProviderError::parse(kind, e.to_string()))
}

fn status_error(kind: ProviderKind, status: StatusCode) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Unauthorized { provider: kind }
        }
        _ => ProviderError::Status {
            provider: kind,
            status: status.as_u16(),
        },
    }
}
