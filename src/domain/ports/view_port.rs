//! Host view port definitions.

use std::sync::Arc;

use crate::domain::entities::{BannerSpec, DocumentPath, LeafId, ResolvedBanner};

/// One open view in the host workspace.
pub trait ViewHandle: Send + Sync {
    /// Identity of the view.
    fn leaf_id(&self) -> LeafId;

    /// Document currently shown, if any.
    fn document(&self) -> Option<DocumentPath>;

    /// Returns true for markdown editing/reading views.
    fn is_markdown(&self) -> bool;

    /// Returns true while the banner element is attached and populated.
    fn has_banner_element(&self) -> bool;

    /// Attaches or updates the banner element, including any icon overlay.
    fn show_banner(&self, banner: &ResolvedBanner, spec: &BannerSpec);

    /// Removes or hides the banner element.
    fn hide_banner(&self);

    /// Removes a persistent icon overlay drawn for a document.
    fn remove_icon_overlay(&self, document: &DocumentPath);
}

/// Enumeration of the host's open views.
pub trait ViewRegistry: Send + Sync {
    /// Finds an open view by identity.
    fn find_view(&self, leaf: &LeafId) -> Option<Arc<dyn ViewHandle>>;

    /// Returns every open view.
    fn open_views(&self) -> Vec<Arc<dyn ViewHandle>>;

    /// Returns the focused view.
    fn active_view(&self) -> Option<Arc<dyn ViewHandle>>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::{Mutex, RwLock};

    /// Records what the core committed to a view.
    pub struct MockView {
        leaf: LeafId,
        document: RwLock<Option<DocumentPath>>,
        markdown: bool,
        banner_present: AtomicBool,
        shown: Mutex<Vec<ResolvedBanner>>,
        hides: AtomicUsize,
        removed_overlays: Mutex<Vec<DocumentPath>>,
    }

    impl MockView {
        /// Creates a markdown view showing a document.
        pub fn markdown(leaf: &str, document: &str) -> Arc<Self> {
            Arc::new(Self {
                leaf: LeafId::new(leaf),
                document: RwLock::new(Some(DocumentPath::new(document))),
                markdown: true,
                banner_present: AtomicBool::new(false),
                shown: Mutex::new(Vec::new()),
                hides: AtomicUsize::new(0),
                removed_overlays: Mutex::new(Vec::new()),
            })
        }

        /// Creates a non-markdown view (graph, canvas, ...).
        pub fn other(leaf: &str) -> Arc<Self> {
            Arc::new(Self {
                leaf: LeafId::new(leaf),
                document: RwLock::new(None),
                markdown: false,
                banner_present: AtomicBool::new(false),
                shown: Mutex::new(Vec::new()),
                hides: AtomicUsize::new(0),
                removed_overlays: Mutex::new(Vec::new()),
            })
        }

        /// Simulates the host tearing the banner element out of the DOM.
        pub fn detach_banner(&self) {
            self.banner_present.store(false, Ordering::SeqCst);
        }

        /// Every banner committed, in order.
        pub fn shown(&self) -> Vec<ResolvedBanner> {
            self.shown.lock().clone()
        }

        /// Last committed banner.
        pub fn last_shown(&self) -> Option<ResolvedBanner> {
            self.shown.lock().last().cloned()
        }

        /// Number of `hide_banner` calls.
        pub fn hides(&self) -> usize {
            self.hides.load(Ordering::SeqCst)
        }

        /// Documents whose overlays were removed.
        pub fn removed_overlays(&self) -> Vec<DocumentPath> {
            self.removed_overlays.lock().clone()
        }
    }

    impl ViewHandle for MockView {
        fn leaf_id(&self) -> LeafId {
            self.leaf.clone()
        }

        fn document(&self) -> Option<DocumentPath> {
            self.document.read().clone()
        }

        fn is_markdown(&self) -> bool {
            self.markdown
        }

        fn has_banner_element(&self) -> bool {
            self.banner_present.load(Ordering::SeqCst)
        }

        fn show_banner(&self, banner: &ResolvedBanner, _spec: &BannerSpec) {
            self.shown.lock().push(banner.clone());
            self.banner_present.store(true, Ordering::SeqCst);
        }

        fn hide_banner(&self) {
            self.hides.fetch_add(1, Ordering::SeqCst);
            self.banner_present.store(false, Ordering::SeqCst);
        }

        fn remove_icon_overlay(&self, document: &DocumentPath) {
            self.removed_overlays.lock().push(document.clone());
        }
    }

    /// In-memory workspace.
    #[derive(Default)]
    pub struct MockViewRegistry {
        views: RwLock<Vec<Arc<MockView>>>,
        active: RwLock<Option<LeafId>>,
    }

    impl MockViewRegistry {
        /// Creates an empty workspace.
        pub fn new() -> Self {
            Self::default()
        }

        /// Opens a view.
        pub fn open(&self, view: Arc<MockView>) {
            self.views.write().push(view);
        }

        /// Closes a view.
        pub fn close(&self, leaf: &str) {
            self.views.write().retain(|v| v.leaf.as_str() != leaf);
        }

        /// Focuses a view.
        pub fn set_active(&self, leaf: &str) {
            *self.active.write() = Some(LeafId::new(leaf));
        }
    }

    impl ViewRegistry for MockViewRegistry {
        fn find_view(&self, leaf: &LeafId) -> Option<Arc<dyn ViewHandle>> {
            self.views
                .read()
                .iter()
                .find(|v| &v.leaf == leaf)
                .map(|v| Arc::clone(v) as Arc<dyn ViewHandle>)
        }

        fn open_views(&self) -> Vec<Arc<dyn ViewHandle>> {
            self.views
                .read()
                .iter()
                .map(|v| Arc::clone(v) as Arc<dyn ViewHandle>)
                .collect()
        }

        fn active_view(&self) -> Option<Arc<dyn ViewHandle>> {
            let active = self.active.read().clone()?;
            self.find_view(&active)
        }
    }
}
