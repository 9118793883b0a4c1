//! Domain error types.

mod provider_error;

pub use provider_error::ProviderError;
