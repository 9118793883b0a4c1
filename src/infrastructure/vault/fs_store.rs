//! File store over a vault directory on disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::domain::entities::DocumentPath;
use crate::domain::ports::{FileHandle, FileStore};

const MAX_LINK_SEARCH_DEPTH: usize = 16;

/// Vault rooted at a directory. Paths are vault-relative with `/` separators.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Opens a vault at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a vault-relative path to disk, refusing anything that escapes the root.
    fn absolute(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            trace!(path, "Rejected path outside the vault");
            return None;
        }
        Some(self.root.join(relative))
    }

    fn handle_for(&self, absolute: &Path) -> Option<FileHandle> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        Some(FileHandle::new(parts.join("/")))
    }

    fn find_by_name(&self, dir: &Path, name: &str, depth: usize, found: &mut Vec<PathBuf>) {
        if depth > MAX_LINK_SEARCH_DEPTH {
            return;
        }
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_dir() {
                if !hidden {
                    self.find_by_name(&path, name, depth + 1, found);
                }
            } else if entry.file_name().to_str() == Some(name) {
                found.push(path);
            }
        }
    }
}

impl FileStore for FsVault {
    fn resolve_path(&self, path: &str) -> Option<FileHandle> {
        let absolute = self.absolute(path)?;
        absolute.is_file().then(|| self.handle_for(&absolute)).flatten()
    }

    fn resolve_link(&self, link: &str, source: &DocumentPath) -> Option<FileHandle> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }

        let parent = source.parent();
        let sibling = if parent.is_empty() {
            link.to_string()
        } else {
            format!("{parent}/{link}")
        };
        if let Some(file) = self.resolve_path(&sibling).or_else(|| self.resolve_path(link)) {
            return Some(file);
        }

        let name = Path::new(link).file_name()?.to_str()?;
        let mut found = Vec::new();
        self.find_by_name(&self.root, name, 0, &mut found);

        let best = found
            .iter()
            .filter_map(|path| self.handle_for(path))
            .filter(|handle| handle.path().ends_with(link))
            .min_by(|a, b| {
                a.path()
                    .matches('/')
                    .count()
                    .cmp(&b.path().matches('/').count())
                    .then_with(|| a.path().cmp(b.path()))
            });
        debug!(
            link,
            candidates = found.len(),
            resolved = ?best.as_ref().map(FileHandle::path),
            "Resolved wiki link by name"
        );
        best
    }

    fn list_folder(&self, folder: &str) -> Vec<FileHandle> {
        let Some(dir) = self.absolute(folder) else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(&dir) else {
            debug!(folder, "Folder not readable");
            return Vec::new();
        };

        let mut files: Vec<FileHandle> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| self.handle_for(&path))
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));
        files
    }

    fn read_binary(&self, file: &FileHandle) -> std::io::Result<Bytes> {
        let absolute = self
            .absolute(file.path())
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::PermissionDenied))?;
        fs::read(absolute).map(Bytes::from)
    }

    fn resource_url(&self, file: &FileHandle) -> String {
        let absolute = self
            .absolute(file.path())
            .unwrap_or_else(|| self.root.join(file.path()));
        reqwest::Url::from_file_path(&absolute)
            .map_or_else(|()| absolute.display().to_string(), String::from)
    }
}
