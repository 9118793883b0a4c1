//! Ordered set of stock-photo providers.

use std::sync::Arc;

use crate::domain::entities::ProviderKind;
use crate::domain::ports::ProviderClient;

/// Providers in priority order. Only credentialed providers take part in
/// resolution.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderClient>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| (p.kind(), p.has_credential())))
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates a registry from providers in priority order.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn ProviderClient>>) -> Self {
        Self { providers }
    }

    /// Returns every provider, eligible or not, in priority order.
    #[must_use]
    pub fn all(&self) -> &[Arc<dyn ProviderClient>] {
        &self.providers
    }

    /// Returns the providers with a configured credential, in priority order.
    #[must_use]
    pub fn eligible(&self) -> Vec<Arc<dyn ProviderClient>> {
        self.providers
            .iter()
            .filter(|p| p.has_credential())
            .cloned()
            .collect()
    }

    /// Returns the kinds of the eligible providers.
    #[must_use]
    pub fn eligible_kinds(&self) -> Vec<ProviderKind> {
        self.eligible().iter().map(|p| p.kind()).collect()
    }

    /// Returns true if no provider can be queried.
    #[must_use]
    pub fn is_unconfigured(&self) -> bool {
        !self.providers.iter().any(|p| p.has_credential())
    }
}
