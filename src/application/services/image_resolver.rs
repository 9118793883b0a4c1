//! Banner image resolution.
//!
//! Direct URLs pass through, vault files and wiki links are read from the file
//! store, and anything else is searched across the credentialed providers in
//! priority order: primary keyword first, then one fallback keyword, then the
//! next provider. Every failure folds into `None`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::provider_registry::ProviderRegistry;
use super::rate_limiter::RateLimiter;
use crate::domain::entities::{
    BannerInput, BannerSettings, BannerSpec, DocumentPath, ResolvedBanner, SearchOptions,
    SourceKind, extension_of, is_accepted_media, is_video_path, mime_for_extension,
};
use crate::domain::ports::{
    FileHandle, FileStore, ImageVerifier, ObjectUrlRegistry, ProviderClient, RandomSource,
};

struct ResolverState {
    providers: ProviderRegistry,
    fallback_keywords: Vec<String>,
    search: SearchOptions,
    verify_images: bool,
}

impl ResolverState {
    fn from_settings(providers: ProviderRegistry, settings: &BannerSettings) -> Self {
        Self {
            providers,
            fallback_keywords: settings
                .fallback_keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            search: settings.search,
            verify_images: settings.verify_images,
        }
    }
}

/// Turns banner specs into displayable banners.
pub struct ImageResolver {
    files: Arc<dyn FileStore>,
    object_urls: Arc<dyn ObjectUrlRegistry>,
    limiter: Arc<RateLimiter>,
    random: Arc<dyn RandomSource>,
    verifier: Option<Arc<dyn ImageVerifier>>,
    state: RwLock<ResolverState>,
    keyword_memo: Mutex<LruCache<String, String>>,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("providers", &self.state.read().providers)
            .field("memoized_keywords", &self.keyword_memo.lock().len())
            .finish_non_exhaustive()
    }
}

impl ImageResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(
        files: Arc<dyn FileStore>,
        object_urls: Arc<dyn ObjectUrlRegistry>,
        limiter: Arc<RateLimiter>,
        random: Arc<dyn RandomSource>,
        providers: ProviderRegistry,
        settings: &BannerSettings,
    ) -> Self {
        Self {
            files,
            object_urls,
            limiter,
            random,
            verifier: None,
            state: RwLock::new(ResolverState::from_settings(providers, settings)),
            keyword_memo: Mutex::new(LruCache::new(memo_capacity(settings))),
        }
    }

    /// Pre-verifies provider images with the given verifier when enabled in settings.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn ImageVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Applies new settings and providers and forgets memoized keywords.
    pub fn reconfigure(&self, providers: ProviderRegistry, settings: &BannerSettings) {
        if providers.is_unconfigured() {
            warn!("No image provider has an API key configured, keyword banners are disabled");
        }
        *self.state.write() = ResolverState::from_settings(providers, settings);
        self.limiter.set_min_interval(settings.rate_limit());

        let mut memo = self.keyword_memo.lock();
        memo.clear();
        memo.resize(memo_capacity(settings));

        info!(
            providers = ?self.state.read().providers.eligible_kinds(),
            "Image resolver reconfigured"
        );
    }

    /// Forgets every memoized keyword result.
    pub fn clear_memo(&self) {
        self.keyword_memo.lock().clear();
    }

    /// Resolves a spec. `fresh` bypasses the keyword memo so that a new
    /// provider image is drawn.
    pub async fn resolve(
        &self,
        document: &DocumentPath,
        spec: &BannerSpec,
        fresh: bool,
    ) -> Option<ResolvedBanner> {
        if let Some(folder) = spec.shuffle_folder() {
            if let Some(banner) = self.resolve_shuffle(folder) {
                return Some(banner);
            }
            debug!(folder, "Shuffle folder has no usable media, using banner input");
        }

        let input = BannerInput::classify(spec.input(), |path| {
            self.files.resolve_path(path).is_some()
        })?;

        match input {
            BannerInput::Url(url) => {
                let is_video = is_video_path(&url);
                Some(ResolvedBanner::new(url, is_video, SourceKind::Url))
            }
            BannerInput::VaultPath(path) => {
                let file = self.files.resolve_path(&path)?;
                self.load_file(&file, SourceKind::VaultPath)
            }
            BannerInput::WikiLink(link) => {
                let Some(file) = self.files.resolve_link(&link, document) else {
                    debug!(link, document = %document, "Wiki link target not found");
                    return None;
                };
                if !is_accepted_media(file.path()) {
                    debug!(path = file.path(), "Wiki link target is not an image or video");
                    return None;
                }
                self.load_file(&file, SourceKind::WikiLink)
            }
            BannerInput::Keyword(keyword) => self.search_keyword(&keyword, fresh).await,
        }
    }

    fn resolve_shuffle(&self, folder: &str) -> Option<ResolvedBanner> {
        let candidates: Vec<FileHandle> = self
            .files
            .list_folder(folder)
            .into_iter()
            .filter(|f| is_accepted_media(f.path()))
            .collect();

        if candidates.is_empty() {
            return None;
        }
        let pick = candidates.get(self.random.index(candidates.len()))?;
        debug!(folder, path = pick.path(), "Shuffled banner picked");
        self.load_file(pick, SourceKind::VaultPath)
    }

    fn load_file(&self, file: &FileHandle, source_kind: SourceKind) -> Option<ResolvedBanner> {
        if is_video_path(file.path()) {
            return Some(ResolvedBanner::new(
                self.files.resource_url(file),
                true,
                source_kind,
            ));
        }

        match self.files.read_binary(file) {
            Ok(bytes) => {
                let mime = extension_of(file.path())
                    .map_or("application/octet-stream", |ext| mime_for_extension(&ext));
                let url = self.object_urls.create(bytes, mime);
                debug!(path = file.path(), url, "Vault image wrapped as object URL");
                Some(ResolvedBanner::new(url, false, source_kind))
            }
            Err(e) => {
                warn!(path = file.path(), error = %e, "Failed to read vault image");
                None
            }
        }
    }

    async fn search_keyword(&self, keyword: &str, fresh: bool) -> Option<ResolvedBanner> {
        if !fresh && let Some(url) = self.keyword_memo.lock().get(keyword).cloned() {
            debug!(keyword, "Keyword memo hit");
            let is_video = is_video_path(&url);
            return Some(ResolvedBanner::new(url, is_video, SourceKind::Keyword));
        }

        let (providers, fallbacks, options, verify) = {
            let state = self.state.read();
            (
                state.providers.eligible(),
                state.fallback_keywords.clone(),
                state.search,
                state.verify_images,
            )
        };

        if providers.is_empty() {
            warn!(keyword, "No image provider has an API key configured");
            return None;
        }

        for provider in &providers {
            if let Some(url) = self
                .attempt(provider.as_ref(), keyword, &options, verify)
                .await
            {
                return Some(self.remember(keyword, url));
            }

            let Some(fallback) = self.pick(&fallbacks) else {
                continue;
            };
            debug!(
                provider = %provider.kind(),
                keyword,
                fallback,
                "Retrying with fallback keyword"
            );
            if let Some(url) = self
                .attempt(provider.as_ref(), fallback, &options, verify)
                .await
            {
                return Some(self.remember(keyword, url));
            }
        }

        debug!(keyword, providers = providers.len(), "Every provider came back empty");
        None
    }

    async fn attempt(
        &self,
        provider: &dyn ProviderClient,
        keyword: &str,
        options: &SearchOptions,
        verify: bool,
    ) -> Option<String> {
        self.limiter.throttle().await;

        let urls = match provider.search(keyword, options).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(
                    provider = %provider.kind(),
                    keyword,
                    transient = e.is_transient(),
                    error = %e,
                    "Provider search failed"
                );
                return None;
            }
        };

        let Some(url) = self.pick(&urls).map(str::to_owned) else {
            debug!(provider = %provider.kind(), keyword, "Provider returned no images");
            return None;
        };

        if verify
            && let Some(verifier) = &self.verifier
            && !verifier.is_loadable(&url).await
        {
            debug!(provider = %provider.kind(), url, "Provider image failed verification");
            return None;
        }

        Some(url)
    }

    fn pick<'a>(&self, items: &'a [String]) -> Option<&'a str> {
        if items.is_empty() {
            return None;
        }
        items
            .get(self.random.index(items.len()))
            .map(String::as_str)
    }

    fn remember(&self, keyword: &str, url: String) -> ResolvedBanner {
        self.keyword_memo
            .lock()
            .put(keyword.to_string(), url.clone());
        let is_video = is_video_path(&url);
        ResolvedBanner::new(url, is_video, SourceKind::Keyword)
    }
}

fn memo_capacity(settings: &BannerSettings) -> NonZeroUsize {
    NonZeroUsize::new(settings.keyword_memo_size).unwrap_or(NonZeroUsize::MIN)
}
