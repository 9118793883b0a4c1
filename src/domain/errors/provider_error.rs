//! Provider search error types.

use thiserror::Error;

use crate::domain::entities::ProviderKind;

/// Failure of a single provider search attempt.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ProviderError {
    #[error("{provider} has no API key configured")]
    MissingCredential { provider: ProviderKind },

    #[error("network error talking to {provider}: {message}")]
    Network {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} returned HTTP {status}")]
    Status { provider: ProviderKind, status: u16 },

    #[error("{provider} rejected the API key")]
    Unauthorized { provider: ProviderKind },

    #[error("malformed {provider} response: {message}")]
    Parse {
        provider: ProviderKind,
        message: String,
    },
}

impl ProviderError {
    /// Creates network error.
    #[must_use]
    pub fn network(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Network {
            provider,
            message: message.into(),
        }
    }

    /// Creates parse error.
    #[must_use]
    pub fn parse(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Parse {
            provider,
            message: message.into(),
        }
    }

    /// Returns the provider the error came from.
    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        match self {
            Self::MissingCredential { provider }
            | Self::Network { provider, .. }
            | Self::Status { provider, .. }
            | Self::Unauthorized { provider }
            | Self::Parse { provider, .. } => *provider,
        }
    }

    /// Returns whether a later attempt could succeed without a config change.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Parse { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingCredential { .. } | Self::Unauthorized { .. } => false,
        }
    }
}
