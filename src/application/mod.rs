//! Application layer: banner caching, resolution and update orchestration.

/// Banner services.
pub mod services;

pub use services::{
    CacheStats, ImageResolver, ProviderRegistry, RateLimiter, StateCache, UpdateMode,
    UpdateOrchestrator, UpdateOutcome,
};
