//! Document metadata port definition.

use crate::domain::entities::{DocumentPath, Metadata};

/// Read access to each document's front-matter key/value map.
pub trait MetadataStore: Send + Sync {
    /// Returns the metadata of a document, `None` if it has none or is unknown.
    fn get_metadata(&self, document: &DocumentPath) -> Option<Metadata>;
}
