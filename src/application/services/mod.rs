pub mod image_resolver;
pub mod provider_registry;
pub mod rate_limiter;
pub mod state_cache;
pub mod update_orchestrator;

pub use image_resolver::ImageResolver;
pub use provider_registry::ProviderRegistry;
pub use rate_limiter::RateLimiter;
pub use state_cache::{CacheStats, StateCache};
pub use update_orchestrator::{UpdateMode, UpdateOrchestrator, UpdateOutcome};
