mod file_store_port;
mod image_verifier_port;
mod metadata_port;
mod object_url_port;
mod provider_port;
mod random_port;
mod view_port;

pub use file_store_port::{FileHandle, FileStore};
pub use image_verifier_port::ImageVerifier;
pub use metadata_port::MetadataStore;
pub use object_url_port::ObjectUrlRegistry;
#[cfg(test)]
pub use provider_port::MockProviderClient;
pub use provider_port::ProviderClient;
pub use random_port::RandomSource;
pub use view_port::{ViewHandle, ViewRegistry};
