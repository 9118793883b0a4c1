//! Domain layer with core banner entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{BannerSpec, CacheEntry, CacheKey, DocumentPath, LeafId, ResolvedBanner};
pub use errors::ProviderError;
pub use ports::{FileStore, MetadataStore, ObjectUrlRegistry, ProviderClient, ViewRegistry};
