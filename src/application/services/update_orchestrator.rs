//! Decides, per view event, whether a banner is reused, re-resolved or left
//! alone, and commits results to the view and the state cache.
//!
//! Every update takes a sequence number and records it as the latest for its
//! view. A result is committed only while its number is still the latest, so
//! a slow resolution that was overtaken never reaches the view or the cache.
//! Visibility checks never take over from a full update still in flight for
//! the same view; they report `Unchanged` and let the full update commit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, info, trace};

use super::image_resolver::ImageResolver;
use super::provider_registry::ProviderRegistry;
use super::state_cache::{CacheStats, StateCache};
use crate::domain::entities::{
    BannerSettings, BannerSpec, BannerState, CacheEntry, CacheKey, DocumentPath, LeafId,
    ResolvedBanner,
};
use crate::domain::ports::{MetadataStore, ObjectUrlRegistry, ViewHandle, ViewRegistry};

/// How much work an update may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Reuse cached state and only re-attach a banner the view lost.
    EnsureVisibility,
    /// Drop the document's cached state and resolve again.
    FullUpdate,
}

/// What an update did to its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A banner was committed.
    Shown(ResolvedBanner),
    /// No banner applies or resolution missed; the banner was hidden.
    Hidden,
    /// Cached state was still on screen; nothing was touched.
    Unchanged,
    /// A newer request for the view took over; the result was discarded.
    Superseded,
    /// The view is gone or shows no document.
    Skipped,
}

/// Latest request issued for a view.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    sequence: u64,
    mode: UpdateMode,
    settled: bool,
}

impl Ticket {
    fn blocks_visibility_check(self) -> bool {
        self.mode == UpdateMode::FullUpdate && !self.settled
    }
}

/// Marks a full update settled once it finishes or is dropped.
struct PendingUpdate<'a> {
    latest: &'a Mutex<HashMap<LeafId, Ticket>>,
    leaf: LeafId,
    sequence: u64,
}

impl Drop for PendingUpdate<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.latest.lock().get_mut(&self.leaf)
            && ticket.sequence == self.sequence
        {
            ticket.settled = true;
        }
    }
}

/// Reacts to view and document events.
pub struct UpdateOrchestrator {
    cache: Mutex<StateCache>,
    resolver: ImageResolver,
    metadata: Arc<dyn MetadataStore>,
    views: Arc<dyn ViewRegistry>,
    object_urls: Arc<dyn ObjectUrlRegistry>,
    settings: RwLock<BannerSettings>,
    latest: Mutex<HashMap<LeafId, Ticket>>,
    next_sequence: AtomicU64,
}

impl std::fmt::Debug for UpdateOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateOrchestrator")
            .field("cache", &*self.cache.lock())
            .field("resolver", &self.resolver)
            .field("tracked_views", &self.latest.lock().len())
            .finish_non_exhaustive()
    }
}

impl UpdateOrchestrator {
    /// Creates an orchestrator owning the given cache and resolver.
    #[must_use]
    pub fn new(
        cache: StateCache,
        resolver: ImageResolver,
        metadata: Arc<dyn MetadataStore>,
        views: Arc<dyn ViewRegistry>,
        object_urls: Arc<dyn ObjectUrlRegistry>,
        settings: BannerSettings,
    ) -> Self {
        Self {
            cache: Mutex::new(cache),
            resolver,
            metadata,
            views,
            object_urls,
            settings: RwLock::new(settings),
            latest: Mutex::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Returns the current settings.
    #[must_use]
    pub fn settings(&self) -> BannerSettings {
        self.settings.read().clone()
    }

    /// Returns a snapshot of the state cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Builds the banner spec of a document from its metadata and folder defaults.
    #[must_use]
    pub fn spec_for(&self, document: &DocumentPath) -> Option<BannerSpec> {
        let metadata = self.metadata.get_metadata(document);
        BannerSpec::from_metadata(document, metadata.as_ref(), &self.settings.read())
    }

    /// Updates one view. `spec` of `None` means no banner applies.
    pub async fn resolve_and_cache(
        &self,
        document: &DocumentPath,
        leaf: &LeafId,
        spec: Option<BannerSpec>,
        mode: UpdateMode,
    ) -> UpdateOutcome {
        match mode {
            UpdateMode::FullUpdate => {
                let pending = self.begin_full_update(leaf);
                self.cache.lock().remove_document(document);
                let fresh = spec.as_ref().is_some_and(BannerSpec::is_shuffled);
                self.run(pending.sequence, document, leaf, spec, mode, fresh)
                    .await
            }
            UpdateMode::EnsureVisibility => match self.begin_visibility_check(leaf) {
                Some(sequence) => {
                    self.run(sequence, document, leaf, spec, mode, false)
                        .await
                }
                None => UpdateOutcome::Unchanged,
            },
        }
    }

    /// Returns the banner cached for a document in a view without resolving.
    #[must_use]
    pub fn get_cached_state(
        &self,
        document: &DocumentPath,
        leaf: &LeafId,
    ) -> Option<ResolvedBanner> {
        let cache = self.cache.lock();
        [false, true].into_iter().find_map(|shuffled| {
            cache
                .get(&StateCache::compute_key(document, leaf, shuffled))
                .and_then(|entry| entry.state.banner().cloned())
        })
    }

    /// Clears every cached state and memoized keyword. Idempotent.
    pub fn flush_all(&self) {
        let removed = self.cache.lock().evict(true);
        self.resolver.clear_memo();
        info!(removed, "Flushed banner state");
    }

    /// Forgets a view and releases everything its entries held.
    pub fn invalidate_view(&self, leaf: &LeafId) {
        self.latest.lock().remove(leaf);
        self.cache.lock().invalidate_for_view(leaf);
    }

    /// A view gained focus.
    pub async fn on_view_activated(&self, leaf: &LeafId) -> UpdateOutcome {
        let Some(sequence) = self.begin_visibility_check(leaf) else {
            return UpdateOutcome::Unchanged;
        };
        self.ensure_visible(sequence, leaf).await
    }

    /// A view re-rendered. Bursts inside the debounce window collapse to the
    /// last event.
    pub async fn on_layout_changed(&self, leaf: &LeafId) -> UpdateOutcome {
        let Some(sequence) = self.begin_visibility_check(leaf) else {
            trace!(leaf = %leaf, "Layout event deferred to pending full update");
            return UpdateOutcome::Unchanged;
        };
        let debounce = self.settings.read().debounce();
        sleep(debounce).await;

        if !self.is_latest(leaf, sequence) {
            trace!(leaf = %leaf, sequence, "Layout event coalesced");
            return UpdateOutcome::Superseded;
        }
        self.ensure_visible(sequence, leaf).await
    }

    /// The host noticed DOM changes in a view; re-attach a lost banner.
    pub async fn on_dom_mutated(&self, leaf: &LeafId) -> UpdateOutcome {
        match self.views.find_view(leaf) {
            Some(view) if view.has_banner_element() => UpdateOutcome::Unchanged,
            Some(_) => match self.begin_visibility_check(leaf) {
                Some(sequence) => self.ensure_visible(sequence, leaf).await,
                None => UpdateOutcome::Unchanged,
            },
            None => UpdateOutcome::Skipped,
        }
    }

    /// A document's metadata changed. Every view of it is fully updated.
    pub async fn on_metadata_changed(
        &self,
        document: &DocumentPath,
    ) -> Vec<(LeafId, UpdateOutcome)> {
        let mut leaves: Vec<LeafId> = self
            .views
            .open_views()
            .into_iter()
            .filter(|view| view.is_markdown() && view.document().as_ref() == Some(document))
            .map(|view| view.leaf_id())
            .collect();

        let cached = self.cache.lock().entries_for_document(document);
        for (_, entry) in cached {
            let shows_document = self
                .views
                .find_view(&entry.leaf_id)
                .is_some_and(|view| view.document().as_ref() == Some(document));
            if shows_document && !leaves.contains(&entry.leaf_id) {
                leaves.push(entry.leaf_id);
            }
        }

        let spec = self.spec_for(document);
        debug!(document = %document, views = leaves.len(), "Metadata changed");

        self.cache.lock().remove_document(document);
        self.update_all(document, leaves, spec.as_ref()).await
    }

    /// Explicit refresh of the focused view with a newly drawn image.
    pub async fn on_refresh(&self) -> Option<UpdateOutcome> {
        let view = self.views.active_view()?;
        let document = view.document().filter(|_| view.is_markdown())?;
        let leaf = view.leaf_id();
        let spec = self.spec_for(&document);

        let pending = self.begin_full_update(&leaf);
        self.cache.lock().remove_document(&document);
        info!(document = %document, leaf = %leaf, "Refreshing banner");
        let outcome = self
            .run(
                pending.sequence,
                &document,
                &leaf,
                spec,
                UpdateMode::FullUpdate,
                true,
            )
            .await;
        Some(outcome)
    }

    /// Settings were saved. Everything is flushed and every open markdown view
    /// is fully updated, since folder defaults may now apply to any of them.
    pub async fn on_settings_saved(
        &self,
        settings: BannerSettings,
        providers: ProviderRegistry,
    ) -> Vec<(LeafId, UpdateOutcome)> {
        self.flush_all();
        self.cache.lock().set_policy(settings.cache);
        self.resolver.reconfigure(providers, &settings);
        *self.settings.write() = settings;
        info!("Banner settings applied");

        let views: Vec<(DocumentPath, LeafId)> = self
            .views
            .open_views()
            .into_iter()
            .filter(|view| view.is_markdown())
            .filter_map(|view| view.document().map(|doc| (doc, view.leaf_id())))
            .collect();

        let updates = views.into_iter().map(|(document, leaf)| {
            let spec = self.spec_for(&document);
            let pending = self.begin_full_update(&leaf);
            async move {
                let fresh = spec.as_ref().is_some_and(BannerSpec::is_shuffled);
                let outcome = self
                    .run(
                        pending.sequence,
                        &document,
                        &leaf,
                        spec,
                        UpdateMode::FullUpdate,
                        fresh,
                    )
                    .await;
                drop(pending);
                (leaf, outcome)
            }
        });
        join_all(updates.collect::<Vec<_>>()).await
    }

    /// A view closed.
    pub fn on_view_closed(&self, leaf: &LeafId) {
        debug!(leaf = %leaf, "View closed");
        self.invalidate_view(leaf);
    }

    /// Sweeps orphaned, expired and surplus cache entries.
    pub fn run_maintenance(&self) -> usize {
        let mut cache = self.cache.lock();
        let removed = cache.evict(false);
        if removed > 0 {
            debug!(removed, stats = %cache.stats(), "Maintenance sweep");
        }
        removed
    }

    /// Runs [`Self::run_maintenance`] every `period` until the orchestrator is dropped.
    pub fn spawn_maintenance(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let orchestrator: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(orchestrator) = orchestrator.upgrade() else {
                    break;
                };
                orchestrator.run_maintenance();
            }
            debug!("Maintenance loop stopped");
        })
    }

    async fn update_all(
        &self,
        document: &DocumentPath,
        leaves: Vec<LeafId>,
        spec: Option<&BannerSpec>,
    ) -> Vec<(LeafId, UpdateOutcome)> {
        let fresh = spec.is_some_and(BannerSpec::is_shuffled);
        let updates = leaves.into_iter().map(|leaf| {
            let pending = self.begin_full_update(&leaf);
            let spec = spec.cloned();
            async move {
                let outcome = self
                    .run(
                        pending.sequence,
                        document,
                        &leaf,
                        spec,
                        UpdateMode::FullUpdate,
                        fresh,
                    )
                    .await;
                drop(pending);
                (leaf, outcome)
            }
        });
        join_all(updates.collect::<Vec<_>>()).await
    }

    async fn ensure_visible(&self, sequence: u64, leaf: &LeafId) -> UpdateOutcome {
        let Some(view) = self.views.find_view(leaf) else {
            return UpdateOutcome::Skipped;
        };
        let Some(document) = view.document().filter(|_| view.is_markdown()) else {
            return UpdateOutcome::Skipped;
        };
        let spec = self.spec_for(&document);
        self.run(
            sequence,
            &document,
            leaf,
            spec,
            UpdateMode::EnsureVisibility,
            false,
        )
        .await
    }

    async fn run(
        &self,
        sequence: u64,
        document: &DocumentPath,
        leaf: &LeafId,
        spec: Option<BannerSpec>,
        mode: UpdateMode,
        fresh: bool,
    ) -> UpdateOutcome {
        let Some(view) = self.views.find_view(leaf) else {
            return UpdateOutcome::Skipped;
        };

        if mode == UpdateMode::EnsureVisibility
            && let Some(outcome) = self.reuse_cached(document, view.as_ref(), spec.as_ref())
        {
            return outcome;
        }

        let resolved = match &spec {
            Some(spec) => self.resolver.resolve(document, spec, fresh).await,
            None => None,
        };

        self.commit(sequence, document, leaf, spec, resolved)
    }

    fn reuse_cached(
        &self,
        document: &DocumentPath,
        view: &dyn ViewHandle,
        spec: Option<&BannerSpec>,
    ) -> Option<UpdateOutcome> {
        let shuffled = spec.is_some_and(BannerSpec::is_shuffled);
        let key = CacheKey::compute(document, &view.leaf_id(), shuffled);
        let entry = self.cache.lock().get(&key).cloned()?;

        if entry.spec.as_ref() != spec {
            debug!(key = %key, "Banner spec changed since last resolution");
            return None;
        }

        match (entry.state.banner(), entry.spec.as_ref()) {
            (Some(banner), Some(spec)) if !view.has_banner_element() => {
                debug!(key = %key, "Re-attaching cached banner");
                view.show_banner(banner, spec);
                Some(UpdateOutcome::Shown(banner.clone()))
            }
            _ => {
                trace!(key = %key, "Cached banner still visible");
                Some(UpdateOutcome::Unchanged)
            }
        }
    }

    fn commit(
        &self,
        sequence: u64,
        document: &DocumentPath,
        leaf: &LeafId,
        spec: Option<BannerSpec>,
        resolved: Option<ResolvedBanner>,
    ) -> UpdateOutcome {
        if !self.is_latest(leaf, sequence) {
            debug!(leaf = %leaf, sequence, "Discarding superseded banner");
            self.discard(resolved.as_ref());
            return UpdateOutcome::Superseded;
        }

        let Some(view) = self
            .views
            .find_view(leaf)
            .filter(|view| view.document().as_ref() == Some(document))
        else {
            debug!(leaf = %leaf, document = %document, "View no longer shows the document");
            self.discard(resolved.as_ref());
            return UpdateOutcome::Skipped;
        };

        let entry = CacheEntry::new(
            document,
            leaf.clone(),
            spec.clone(),
            BannerState::from(resolved.clone()),
        );
        {
            let mut cache = self.cache.lock();
            cache.set(entry.key.clone(), entry);
            cache.evict(false);
        }

        match (resolved, spec) {
            (Some(banner), Some(spec)) => {
                view.show_banner(&banner, &spec);
                UpdateOutcome::Shown(banner)
            }
            _ => {
                view.hide_banner();
                UpdateOutcome::Hidden
            }
        }
    }

    fn discard(&self, resolved: Option<&ResolvedBanner>) {
        if let Some(url) = resolved.and_then(ResolvedBanner::object_url) {
            self.object_urls.revoke(url);
        }
    }

    fn issue(
        &self,
        latest: &mut HashMap<LeafId, Ticket>,
        leaf: &LeafId,
        mode: UpdateMode,
    ) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        latest.insert(
            leaf.clone(),
            Ticket {
                sequence,
                mode,
                settled: false,
            },
        );
        sequence
    }

    fn begin_full_update(&self, leaf: &LeafId) -> PendingUpdate<'_> {
        let sequence = self.issue(&mut self.latest.lock(), leaf, UpdateMode::FullUpdate);
        PendingUpdate {
            latest: &self.latest,
            leaf: leaf.clone(),
            sequence,
        }
    }

    /// Returns `None` while a full update for the view is still in flight.
    fn begin_visibility_check(&self, leaf: &LeafId) -> Option<u64> {
        let mut latest = self.latest.lock();
        if latest.get(leaf).is_some_and(|t| t.blocks_visibility_check()) {
            return None;
        }
        Some(self.issue(&mut latest, leaf, UpdateMode::EnsureVisibility))
    }

    fn is_latest(&self, leaf: &LeafId, sequence: u64) -> bool {
        self.latest
            .lock()
            .get(leaf)
            .is_some_and(|t| t.sequence == sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::json;

    use super::super::rate_limiter::RateLimiter;
    use crate::domain::entities::{FolderBanner, ProviderKind, SearchOptions, SourceKind};
    use crate::domain::errors::ProviderError;
    use crate::domain::ports::mocks::{
        FirstPick, MockFileStore, MockMetadataStore, MockView, MockViewRegistry,
        RecordingObjectUrls,
    };
    use crate::domain::ports::{FileStore, MockProviderClient, ProviderClient};

    /// Answers after a fixed delay with a URL derived from the keyword.
    struct SlowProvider {
        delay: Duration,
        calls: AtomicU64,
    }

    #[async_trait]
    impl ProviderClient for SlowProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Pexels
        }

        fn has_credential(&self) -> bool {
            true
        }

        async fn search(
            &self,
            keyword: &str,
            _options: &SearchOptions,
        ) -> Result<Vec<String>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.delay).await;
            Ok(vec![format!("https://img.example/{keyword}/{call}.jpg")])
        }
    }

    struct Fixture {
        orchestrator: Arc<UpdateOrchestrator>,
        metadata: Arc<MockMetadataStore>,
        views: Arc<MockViewRegistry>,
        files: Arc<MockFileStore>,
        urls: Arc<RecordingObjectUrls>,
    }

    impl Fixture {
        fn new(providers: Vec<Arc<dyn ProviderClient>>) -> Self {
            Self::with_settings(providers, settings())
        }

        fn with_settings(providers: Vec<Arc<dyn ProviderClient>>, settings: BannerSettings) -> Self {
            let metadata = Arc::new(MockMetadataStore::new());
            let views = Arc::new(MockViewRegistry::new());
            let files = Arc::new(MockFileStore::new());
            let urls = Arc::new(RecordingObjectUrls::new());

            let cache = StateCache::new(
                settings.cache,
                Arc::clone(&urls) as Arc<dyn ObjectUrlRegistry>,
                Arc::clone(&views) as Arc<dyn ViewRegistry>,
            );
            let resolver = ImageResolver::new(
                Arc::clone(&files) as Arc<dyn FileStore>,
                Arc::clone(&urls) as Arc<dyn ObjectUrlRegistry>,
                Arc::new(RateLimiter::new(settings.rate_limit())),
                Arc::new(FirstPick),
                ProviderRegistry::new(providers),
                &settings,
            );
            let orchestrator = Arc::new(UpdateOrchestrator::new(
                cache,
                resolver,
                Arc::clone(&metadata) as Arc<dyn MetadataStore>,
                Arc::clone(&views) as Arc<dyn ViewRegistry>,
                Arc::clone(&urls) as Arc<dyn ObjectUrlRegistry>,
                settings,
            ));

            Self {
                orchestrator,
                metadata,
                views,
                files,
                urls,
            }
        }

        fn open(&self, leaf: &str, document: &str) -> Arc<MockView> {
            let view = MockView::markdown(leaf, document);
            self.views.open(Arc::clone(&view));
            view
        }
    }

    fn settings() -> BannerSettings {
        BannerSettings {
            fallback_keywords: Vec::new(),
            rate_limit_ms: 0,
            verify_images: false,
            ..BannerSettings::default()
        }
    }

    fn counting_provider(times: usize) -> Arc<dyn ProviderClient> {
        let mut mock = MockProviderClient::new();
        mock.expect_kind().return_const(ProviderKind::Unsplash);
        mock.expect_has_credential().return_const(true);
        let calls = AtomicU64::new(0);
        mock.expect_search().times(times).returning(move |keyword, _| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![format!("https://img.example/{keyword}/{n}.jpg")])
        });
        Arc::new(mock)
    }

    fn doc(path: &str) -> DocumentPath {
        DocumentPath::new(path)
    }

    fn leaf(id: &str) -> LeafId {
        LeafId::new(id)
    }

    #[tokio::test]
    async fn test_full_update_commits_and_caches() {
        let f = Fixture::new(Vec::new());
        let view = f.open("L1", "notes/a.md");
        let spec = BannerSpec::new("https://example.com/a.png");

        let outcome = f
            .orchestrator
            .resolve_and_cache(&doc("notes/a.md"), &leaf("L1"), Some(spec), UpdateMode::FullUpdate)
            .await;

        let UpdateOutcome::Shown(banner) = outcome else {
            panic!("expected a committed banner, got {outcome:?}");
        };
        assert_eq!(banner.source_kind, SourceKind::Url);
        assert_eq!(view.last_shown(), Some(banner.clone()));
        assert_eq!(
            f.orchestrator.get_cached_state(&doc("notes/a.md"), &leaf("L1")),
            Some(banner)
        );
    }

    #[tokio::test]
    async fn test_ensure_visibility_reuses_cache_without_network() {
        let f = Fixture::new(vec![counting_provider(1)]);
        let view = f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "mountains" }));

        let first = f.orchestrator.on_metadata_changed(&doc("notes/a.md")).await;
        assert!(matches!(first[0].1, UpdateOutcome::Shown(_)));

        let again = f.orchestrator.on_view_activated(&leaf("L1")).await;
        assert_eq!(again, UpdateOutcome::Unchanged);

        view.detach_banner();
        let reattached = f.orchestrator.on_view_activated(&leaf("L1")).await;
        assert!(matches!(reattached, UpdateOutcome::Shown(_)));
        assert_eq!(view.shown().len(), 2);
        assert_eq!(view.shown()[0], view.shown()[1]);
    }

    #[tokio::test]
    async fn test_miss_is_cached_and_hidden() {
        let f = Fixture::new(Vec::new());
        let view = f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "mountains" }));

        let first = f.orchestrator.on_view_activated(&leaf("L1")).await;
        assert_eq!(first, UpdateOutcome::Hidden);
        assert_eq!(view.hides(), 1);
        assert_eq!(f.orchestrator.cache_stats().misses, 1);

        let second = f.orchestrator.on_view_activated(&leaf("L1")).await;
        assert_eq!(second, UpdateOutcome::Unchanged);
        assert_eq!(view.hides(), 1);
    }

    #[tokio::test]
    async fn test_document_without_banner_is_hidden() {
        let f = Fixture::new(Vec::new());
        let view = f.open("L1", "notes/plain.md");

        let outcome = f.orchestrator.on_view_activated(&leaf("L1")).await;

        assert_eq!(outcome, UpdateOutcome::Hidden);
        assert_eq!(view.hides(), 1);
        assert!(view.shown().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overtaken_resolution_is_discarded() {
        let slow: Arc<dyn ProviderClient> = Arc::new(SlowProvider {
            delay: Duration::from_secs(5),
            calls: AtomicU64::new(0),
        });
        let f = Fixture::new(vec![slow]);
        let view = f.open("L1", "notes/a.md");
        let orchestrator = Arc::clone(&f.orchestrator);
        let (document, l1) = (doc("notes/a.md"), leaf("L1"));

        let (old, new) = tokio::join!(
            orchestrator.resolve_and_cache(
                &document,
                &l1,
                Some(BannerSpec::new("forest")),
                UpdateMode::FullUpdate,
            ),
            async {
                sleep(Duration::from_millis(100)).await;
                orchestrator
                    .resolve_and_cache(
                        &document,
                        &l1,
                        Some(BannerSpec::new("https://example.com/new.png")),
                        UpdateMode::FullUpdate,
                    )
                    .await
            }
        );

        assert_eq!(old, UpdateOutcome::Superseded);
        assert!(matches!(new, UpdateOutcome::Shown(_)));
        assert_eq!(view.shown().len(), 1);
        assert_eq!(
            view.last_shown().map(|b| b.image_url),
            Some("https://example.com/new.png".to_string())
        );
        assert_eq!(f.orchestrator.cache_stats().entries, 1);
    }

    #[test]
    fn test_superseded_object_url_is_released() {
        let f = Fixture::new(Vec::new());
        f.open("L1", "notes/a.md");
        let orchestrator = &f.orchestrator;

        let stale = orchestrator.begin_full_update(&leaf("L1")).sequence;
        drop(orchestrator.begin_full_update(&leaf("L1")));
        let url = f.urls.create(bytes::Bytes::from_static(b"png"), "image/png");
        let banner = ResolvedBanner::new(url.clone(), false, SourceKind::VaultPath);

        let outcome = orchestrator.commit(
            stale,
            &doc("notes/a.md"),
            &leaf("L1"),
            Some(BannerSpec::new("a.png")),
            Some(banner),
        );

        assert_eq!(outcome, UpdateOutcome::Superseded);
        assert_eq!(f.urls.revoke_count(&url), 1);
        assert_eq!(f.orchestrator.cache_stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_closed_mid_resolution_is_skipped() {
        let slow: Arc<dyn ProviderClient> = Arc::new(SlowProvider {
            delay: Duration::from_secs(2),
            calls: AtomicU64::new(0),
        });
        let f = Fixture::new(vec![slow]);
        let view = f.open("L1", "notes/a.md");
        let (document, l1) = (doc("notes/a.md"), leaf("L1"));

        let (outcome, ()) = tokio::join!(
            f.orchestrator.resolve_and_cache(
                &document,
                &l1,
                Some(BannerSpec::new("forest")),
                UpdateMode::FullUpdate,
            ),
            async {
                sleep(Duration::from_millis(500)).await;
                f.views.close("L1");
            }
        );

        assert_eq!(outcome, UpdateOutcome::Skipped);
        assert!(view.shown().is_empty());
        assert_eq!(f.orchestrator.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_metadata_change_fans_out_to_every_view_of_document() {
        let f = Fixture::new(Vec::new());
        let left = f.open("L1", "notes/a.md");
        let right = f.open("L2", "notes/a.md");
        let other = f.open("L3", "notes/b.md");
        f.metadata.set("notes/a.md", json!({ "banner": "https://example.com/a.png" }));

        let outcomes = f.orchestrator.on_metadata_changed(&doc("notes/a.md")).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, o)| matches!(o, UpdateOutcome::Shown(_))));
        assert_eq!(left.shown().len(), 1);
        assert_eq!(right.shown().len(), 1);
        assert!(other.shown().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_change_releases_previous_vault_image() {
        let f = Fixture::new(Vec::new());
        f.open("L1", "notes/a.md");
        f.files.insert("img/one.png", b"1");
        f.files.insert("img/two.png", b"2");

        f.metadata.set("notes/a.md", json!({ "banner": "img/one.png" }));
        f.orchestrator.on_metadata_changed(&doc("notes/a.md")).await;
        let first = f.orchestrator.get_cached_state(&doc("notes/a.md"), &leaf("L1")).unwrap();

        f.metadata.set("notes/a.md", json!({ "banner": "img/two.png" }));
        f.orchestrator.on_metadata_changed(&doc("notes/a.md")).await;

        assert_eq!(f.urls.revoke_count(&first.image_url), 1);
        assert_eq!(f.urls.live_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_draws_a_new_image_for_active_view_only() {
        let f = Fixture::new(vec![counting_provider(2)]);
        let active = f.open("L1", "notes/a.md");
        let background = f.open("L2", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "ocean" }));

        f.orchestrator.on_view_activated(&leaf("L1")).await;
        f.orchestrator.on_view_activated(&leaf("L2")).await;
        f.views.set_active("L1");

        let refreshed = f.orchestrator.on_refresh().await;

        assert!(matches!(refreshed, Some(UpdateOutcome::Shown(_))));
        assert_eq!(active.shown().len(), 2);
        assert_ne!(active.shown()[0], active.shown()[1]);
        assert_eq!(background.shown().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_event_does_not_override_pending_refresh() {
        let slow = Arc::new(SlowProvider {
            delay: Duration::from_secs(2),
            calls: AtomicU64::new(0),
        });
        let f = Fixture::new(vec![Arc::clone(&slow) as Arc<dyn ProviderClient>]);
        let view = f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "ocean" }));
        f.orchestrator.on_view_activated(&leaf("L1")).await;
        f.views.set_active("L1");
        let l1 = leaf("L1");

        let (refreshed, layout) = tokio::join!(f.orchestrator.on_refresh(), async {
            sleep(Duration::from_millis(10)).await;
            f.orchestrator.on_layout_changed(&l1).await
        });

        let Some(UpdateOutcome::Shown(banner)) = refreshed else {
            panic!("expected the refresh to commit, got {refreshed:?}");
        };
        assert_eq!(banner.image_url, "https://img.example/ocean/1.jpg");
        assert_eq!(layout, UpdateOutcome::Unchanged);
        assert_eq!(view.shown().len(), 2);
        assert_eq!(view.last_shown(), Some(banner.clone()));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 2);

        view.detach_banner();
        let reattached = f.orchestrator.on_layout_changed(&l1).await;
        assert_eq!(reattached, UpdateOutcome::Shown(banner));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_full_update_does_not_block_visibility_checks() {
        let slow = Arc::new(SlowProvider {
            delay: Duration::from_secs(2),
            calls: AtomicU64::new(0),
        });
        let f = Fixture::new(vec![Arc::clone(&slow) as Arc<dyn ProviderClient>]);
        f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "ocean" }));
        let (document, l1) = (doc("notes/a.md"), leaf("L1"));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(100),
            f.orchestrator.resolve_and_cache(
                &document,
                &l1,
                Some(BannerSpec::new("ocean")),
                UpdateMode::FullUpdate,
            ),
        )
        .await;
        assert!(cancelled.is_err());

        let outcome = f.orchestrator.on_view_activated(&l1).await;
        assert!(matches!(outcome, UpdateOutcome::Shown(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_active_view() {
        let f = Fixture::new(Vec::new());
        assert_eq!(f.orchestrator.on_refresh().await, None);
    }

    #[tokio::test]
    async fn test_settings_save_applies_new_folder_defaults() {
        let f = Fixture::new(Vec::new());
        let journal = f.open("L1", "journal/2024-01-01.md");
        let other = f.open("L2", "notes/b.md");
        f.views.open(MockView::other("G1"));

        assert_eq!(f.orchestrator.on_view_activated(&leaf("L1")).await, UpdateOutcome::Hidden);

        let mut settings = settings();
        settings.folder_defaults.push(FolderBanner {
            folder: "journal".into(),
            image: "https://example.com/journal.png".into(),
            ..FolderBanner::default()
        });
        let outcomes = f
            .orchestrator
            .on_settings_saved(settings, ProviderRegistry::default())
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(journal.last_shown(), Some(b) if b.image_url.ends_with("journal.png")));
        assert!(other.shown().is_empty());
        assert_eq!(f.orchestrator.settings().folder_defaults.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_bursts_are_coalesced() {
        let f = Fixture::new(Vec::new());
        let view = f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "https://example.com/a.png" }));
        let o = &f.orchestrator;
        let l1 = leaf("L1");

        let (first, second, third) = tokio::join!(
            o.on_layout_changed(&l1),
            o.on_layout_changed(&l1),
            o.on_layout_changed(&l1),
        );

        assert_eq!(first, UpdateOutcome::Superseded);
        assert_eq!(second, UpdateOutcome::Superseded);
        assert!(matches!(third, UpdateOutcome::Shown(_)));
        assert_eq!(view.shown().len(), 1);
    }

    #[tokio::test]
    async fn test_dom_mutation_reattaches_lost_banner() {
        let f = Fixture::new(vec![counting_provider(1)]);
        let view = f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "desert" }));

        f.orchestrator.on_view_activated(&leaf("L1")).await;
        assert_eq!(f.orchestrator.on_dom_mutated(&leaf("L1")).await, UpdateOutcome::Unchanged);

        view.detach_banner();
        let outcome = f.orchestrator.on_dom_mutated(&leaf("L1")).await;

        assert!(matches!(outcome, UpdateOutcome::Shown(_)));
        assert!(view.has_banner_element());
        assert_eq!(f.orchestrator.on_dom_mutated(&leaf("missing")).await, UpdateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_closing_view_releases_its_state() {
        let f = Fixture::new(Vec::new());
        let view = f.open("L1", "notes/a.md");
        f.files.insert("img/cover.png", b"png");
        f.metadata.set("notes/a.md", json!({ "banner": "img/cover.png", "icon": "🌄" }));

        f.orchestrator.on_view_activated(&leaf("L1")).await;
        assert_eq!(f.urls.live_count(), 1);

        f.orchestrator.on_view_closed(&leaf("L1"));

        assert_eq!(f.urls.live_count(), 0);
        assert_eq!(view.removed_overlays(), vec![doc("notes/a.md")]);
        assert!(f.orchestrator.get_cached_state(&doc("notes/a.md"), &leaf("L1")).is_none());
    }

    #[tokio::test]
    async fn test_zero_capacity_still_keeps_committed_banner() {
        let mut settings = settings();
        settings.cache.max_entries = 0;
        let f = Fixture::with_settings(Vec::new(), settings);
        let view = f.open("L1", "notes/a.md");
        f.files.insert("img/cover.png", b"png");
        f.metadata.set("notes/a.md", json!({ "banner": "img/cover.png" }));

        let outcome = f.orchestrator.on_view_activated(&leaf("L1")).await;

        let UpdateOutcome::Shown(banner) = outcome else {
            panic!("expected a committed banner, got {outcome:?}");
        };
        assert_eq!(f.urls.revoke_count(&banner.image_url), 0);
        assert_eq!(f.urls.live_count(), 1);
        assert_eq!(view.last_shown(), Some(banner));
        assert_eq!(f.orchestrator.cache_stats().entries, 1);
    }

    #[tokio::test]
    async fn test_flush_all_is_idempotent() {
        let f = Fixture::new(Vec::new());
        f.open("L1", "notes/a.md");
        f.files.insert("img/cover.png", b"png");
        f.metadata.set("notes/a.md", json!({ "banner": "img/cover.png" }));
        f.orchestrator.on_view_activated(&leaf("L1")).await;

        f.orchestrator.flush_all();
        f.orchestrator.flush_all();

        assert_eq!(f.orchestrator.cache_stats().entries, 0);
        assert_eq!(f.urls.revoked().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_expires_old_entries() {
        let f = Fixture::new(Vec::new());
        f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "https://example.com/a.png" }));
        f.orchestrator.on_view_activated(&leaf("L1")).await;

        tokio::time::advance(Duration::from_secs(31 * 60)).await;

        assert_eq!(f.orchestrator.run_maintenance(), 1);
        assert_eq!(f.orchestrator.run_maintenance(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_maintenance_sweeps_periodically() {
        let f = Fixture::new(Vec::new());
        f.open("L1", "notes/a.md");
        f.metadata.set("notes/a.md", json!({ "banner": "https://example.com/a.png" }));
        f.orchestrator.on_view_activated(&leaf("L1")).await;

        let handle = f.orchestrator.spawn_maintenance(Duration::from_secs(60));
        sleep(Duration::from_secs(31 * 60 + 60)).await;

        assert_eq!(f.orchestrator.cache_stats().entries, 0);
        handle.abort();
    }
}
