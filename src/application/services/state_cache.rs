//! Per-view banner state cache with bounded lifetime.
//!
//! Entries own the object URLs their banners were resolved to. Whichever path
//! removes an entry (age, size, orphan, view teardown, document drop, flush or
//! overwrite) releases that URL, and no other code does.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::domain::entities::{CacheEntry, CacheKey, CachePolicy, DocumentPath, LeafId};
use crate::domain::ports::{ObjectUrlRegistry, ViewRegistry};

/// Banner state per `(document, view, shuffle variant)`.
pub struct StateCache {
    entries: HashMap<CacheKey, CacheEntry>,
    policy: CachePolicy,
    object_urls: Arc<dyn ObjectUrlRegistry>,
    views: Arc<dyn ViewRegistry>,
}

impl std::fmt::Debug for StateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCache")
            .field("entries", &self.entries.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl StateCache {
    /// Creates an empty cache. Zero bounds in `policy` are raised to one.
    #[must_use]
    pub fn new(
        policy: CachePolicy,
        object_urls: Arc<dyn ObjectUrlRegistry>,
        views: Arc<dyn ViewRegistry>,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            policy: policy.clamped(),
            object_urls,
            views,
        }
    }

    /// Computes the key for a document shown in a view.
    #[must_use]
    pub fn compute_key(document: &DocumentPath, leaf: &LeafId, is_shuffled: bool) -> CacheKey {
        CacheKey::compute(document, leaf, is_shuffled)
    }

    /// Returns the entry stored under a key.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        let entry = self.entries.get(key);
        trace!(key = %key, hit = entry.is_some(), "State cache lookup");
        entry
    }

    /// Returns true if an entry is stored under a key.
    #[must_use]
    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores an entry, replacing any previous one under the same key.
    ///
    /// The replaced entry is released like any other removal, except for
    /// resources the new entry still uses.
    pub fn set(&mut self, key: CacheKey, mut entry: CacheEntry) {
        entry.key = key.clone();
        let kept_url = entry.state.object_url().map(str::to_owned);
        let keeps_icon = entry.icon_state.as_ref().is_some_and(|i| i.persistent);

        if let Some(old) = self.entries.insert(key.clone(), entry) {
            if let Some(url) = old.state.object_url()
                && kept_url.as_deref() != Some(url)
            {
                self.revoke(url);
            }
            if !keeps_icon {
                self.remove_overlay(&key, &old);
            }
            trace!(key = %key, "Replaced state cache entry");
        }
    }

    /// Returns every entry of a document, whatever view or variant.
    #[must_use]
    pub fn entries_for_document(&self, document: &DocumentPath) -> Vec<(CacheKey, CacheEntry)> {
        self.entries
            .iter()
            .filter(|(key, _)| key.belongs_to(document))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Sweeps orphaned, expired and surplus entries. `force` clears everything.
    ///
    /// Returns the number of entries removed.
    pub fn evict(&mut self, force: bool) -> usize {
        if force {
            let removed = self.remove_where(|_| true);
            debug!(removed, "Flushed state cache");
            return removed;
        }

        let views = Arc::clone(&self.views);
        let orphaned = self.remove_where(|entry| views.find_view(&entry.leaf_id).is_none());

        let now = Instant::now();
        let max_age = self.policy.max_age();
        let shuffled_max_age = self.policy.shuffled_max_age();
        let expired = self.remove_where(|entry| {
            let limit = if entry.is_shuffled {
                shuffled_max_age
            } else {
                max_age
            };
            now.saturating_duration_since(entry.timestamp) > limit
        });

        let surplus = self.evict_oldest_beyond(self.policy.max_entries);

        if orphaned + expired + surplus > 0 {
            debug!(
                orphaned,
                expired,
                surplus,
                remaining = self.entries.len(),
                "Evicted state cache entries"
            );
        }

        orphaned + expired + surplus
    }

    /// Removes every entry owned by a view.
    pub fn invalidate_for_view(&mut self, leaf: &LeafId) -> usize {
        let removed = self.remove_where(|entry| &entry.leaf_id == leaf);
        if removed > 0 {
            debug!(leaf = %leaf, removed, "Invalidated view state");
        }
        removed
    }

    /// Removes every entry of a document.
    pub fn remove_document(&mut self, document: &DocumentPath) -> usize {
        let removed = self.remove_where(|entry| entry.key.belongs_to(document));
        if removed > 0 {
            trace!(document = %document, removed, "Dropped document state");
        }
        removed
    }

    /// Replaces the eviction bounds; takes effect on the next sweep.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy.clamped();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a snapshot of the cache contents.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            entries: self.entries.len(),
            ..CacheStats::default()
        };
        for entry in self.entries.values() {
            if entry.is_shuffled {
                stats.shuffled += 1;
            }
            if entry.state.object_url().is_some() {
                stats.object_urls += 1;
            }
            if entry.state.banner().is_none() {
                stats.misses += 1;
            }
        }
        stats
    }

    fn evict_oldest_beyond(&mut self, max_entries: usize) -> usize {
        let surplus = self.entries.len().saturating_sub(max_entries);
        if surplus == 0 {
            return 0;
        }

        let mut by_age: Vec<(Instant, CacheKey)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.timestamp, key.clone()))
            .collect();
        by_age.sort();

        for (_, key) in by_age.into_iter().take(surplus) {
            if let Some(entry) = self.entries.remove(&key) {
                self.release(&key, &entry);
            }
        }
        surplus
    }

    fn remove_where(&mut self, predicate: impl Fn(&CacheEntry) -> bool) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            if let Some(entry) = self.entries.remove(key) {
                self.release(key, &entry);
            }
        }
        doomed.len()
    }

    fn release(&self, key: &CacheKey, entry: &CacheEntry) {
        if let Some(url) = entry.state.object_url() {
            self.revoke(url);
        }
        self.remove_overlay(key, entry);
    }

    fn revoke(&self, url: &str) {
        if !self.object_urls.revoke(url) {
            trace!(url, "Object URL was already released");
        }
    }

    fn remove_overlay(&self, key: &CacheKey, entry: &CacheEntry) {
        if !entry.icon_state.as_ref().is_some_and(|i| i.persistent) {
            return;
        }
        if let Some(document) = key.document()
            && let Some(view) = self.views.find_view(&entry.leaf_id)
        {
            view.remove_icon_overlay(&document);
        }
    }
}

/// Snapshot of the cache contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries.
    pub entries: usize,
    /// Entries of shuffled banners.
    pub shuffled: usize,
    /// Entries holding an object URL.
    pub object_urls: usize,
    /// Entries recording a resolution miss.
    pub misses: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Banner cache: {} entries ({} shuffled, {} object URLs, {} misses)",
            self.entries, self.shuffled, self.object_urls, self.misses
        )
    }
}
