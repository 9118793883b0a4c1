//! Vault file store port definition.

use bytes::Bytes;

use crate::domain::entities::DocumentPath;

/// Handle to an existing vault file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: String,
}

impl FileHandle {
    /// Creates a handle for a vault-relative path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the vault-relative path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Synchronous access to vault-local files.
pub trait FileStore: Send + Sync {
    /// Resolves a vault-relative path to an existing file.
    fn resolve_path(&self, path: &str) -> Option<FileHandle>;

    /// Resolves a wiki-link target as seen from the source document.
    fn resolve_link(&self, link: &str, source: &DocumentPath) -> Option<FileHandle>;

    /// Lists the files directly inside a vault folder.
    fn list_folder(&self, folder: &str) -> Vec<FileHandle>;

    /// Reads a file's content.
    ///
    /// # Errors
    /// Returns error if the file cannot be read.
    fn read_binary(&self, file: &FileHandle) -> std::io::Result<Bytes>;

    /// Returns a URL the host can stream the file from.
    fn resource_url(&self, file: &FileHandle) -> String;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::RwLock;

    /// In-memory vault.
    #[derive(Default)]
    pub struct MockFileStore {
        files: RwLock<BTreeMap<String, Bytes>>,
        unreadable: RwLock<Vec<String>>,
        reads: AtomicUsize,
    }

    impl MockFileStore {
        /// Creates an empty vault.
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a file.
        pub fn insert(&self, path: &str, content: &[u8]) {
            self.files
                .write()
                .insert(path.to_string(), Bytes::copy_from_slice(content));
        }

        /// Makes reads of an existing file fail.
        pub fn make_unreadable(&self, path: &str) {
            self.unreadable.write().push(path.to_string());
        }

        /// Number of `read_binary` calls so far.
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl FileStore for MockFileStore {
        fn resolve_path(&self, path: &str) -> Option<FileHandle> {
            self.files
                .read()
                .contains_key(path)
                .then(|| FileHandle::new(path))
        }

        fn resolve_link(&self, link: &str, _source: &DocumentPath) -> Option<FileHandle> {
            if let Some(file) = self.resolve_path(link) {
                return Some(file);
            }
            self.files
                .read()
                .keys()
                .find(|path| path.rsplit('/').next() == Some(link))
                .map(|path| FileHandle::new(path.clone()))
        }

        fn list_folder(&self, folder: &str) -> Vec<FileHandle> {
            self.files
                .read()
                .keys()
                .filter(|path| {
                    path.rsplit_once('/')
                        .map_or(folder.is_empty(), |(parent, _)| parent == folder)
                })
                .map(|path| FileHandle::new(path.clone()))
                .collect()
        }

        fn read_binary(&self, file: &FileHandle) -> std::io::Result<Bytes> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.unreadable.read().iter().any(|p| p == file.path()) {
                return Err(std::io::Error::other("permission denied"));
            }
            self.files
                .read()
                .get(file.path())
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }

        fn resource_url(&self, file: &FileHandle) -> String {
            format!("app://vault/{}", file.path())
        }
    }
}
