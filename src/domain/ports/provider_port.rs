//! Stock-photo provider port definition.

use async_trait::async_trait;

use crate::domain::entities::{ProviderKind, SearchOptions};
use crate::domain::errors::ProviderError;

/// One remote image source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Which provider this client talks to.
    fn kind(&self) -> ProviderKind;

    /// Returns true if a non-empty credential is configured.
    fn has_credential(&self) -> bool;

    /// Searches by keyword and returns candidate image URLs.
    async fn search(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<String>, ProviderError>;
}
