//! Catalog sync layer.
//!
//! Holds the three catalog collections in memory, hydrates them from the
//! document store once per session and writes the whole collection back
//! after every accepted mutation.
//!
//! Each collection runs its own phase machine
//! (`Uninitialized -> Hydrating -> Ready`). Writes for a collection are only
//! possible once it is `Ready`, so a slow or failed first read can never be
//! overwritten by the empty local default.

mod collection;
mod writer;

pub use collection::CollectionSync;

use std::sync::Arc;

use support_portal_core::{
    CatalogError, CollectionName, IdGenerator, Intent, Link, SavedQuery, Video, VideoCandidate,
    import_videos,
};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::store::DocumentStore;

/// Diagnostics kept for late subscribers.
const DIAGNOSTIC_CAPACITY: usize = 32;

/// Lifecycle of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Uninitialized,
    Hydrating,
    Ready,
}

/// Non-fatal remote failure for the presentation layer to show briefly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    HydrateFailed {
        collection: CollectionName,
        message: String,
    },
    PersistFailed {
        collection: CollectionName,
        message: String,
    },
}

impl Diagnostic {
    #[must_use]
    pub const fn collection(&self) -> CollectionName {
        match self {
            Self::HydrateFailed { collection, .. } | Self::PersistFailed { collection, .. } => {
                *collection
            }
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HydrateFailed {
                collection,
                message,
            } => write!(f, "Could not load {collection}: {message}"),
            Self::PersistFailed {
                collection,
                message,
            } => write!(f, "Could not save {collection}: {message}"),
        }
    }
}

/// Result of importing channel search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Candidates offered for import.
    pub found: usize,
    pub added: usize,
    pub skipped: usize,
}

/// Errors from a mutation request.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("The {0} collection is still loading")]
    NotReady(CollectionName),

    #[error(transparent)]
    Rejected(#[from] CatalogError),
}

/// A collection value, addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionSnapshot {
    Videos(Arc<Vec<Video>>),
    Queries(Arc<Vec<SavedQuery>>),
    Links(Arc<Vec<Link>>),
}

impl CollectionSnapshot {
    #[must_use]
    pub const fn collection(&self) -> CollectionName {
        match self {
            Self::Videos(_) => CollectionName::Videos,
            Self::Queries(_) => CollectionName::Queries,
            Self::Links(_) => CollectionName::Links,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Videos(items) => items.len(),
            Self::Queries(items) => items.len(),
            Self::Links(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The three catalog collections bound to one document store.
pub struct CatalogSync<S> {
    store: Arc<S>,
    ids: &'static IdGenerator,
    videos: CollectionSync<Video>,
    queries: CollectionSync<SavedQuery>,
    links: CollectionSync<Link>,
    diagnostics: broadcast::Sender<Diagnostic>,
}

impl<S> std::fmt::Debug for CatalogSync<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSync")
            .field("videos", &self.videos)
            .field("queries", &self.queries)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> CatalogSync<S> {
    /// Bind to `store`. Nothing is read until [`CatalogSync::initialize`].
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let (diagnostics, _) = broadcast::channel(DIAGNOSTIC_CAPACITY);
        Self {
            store,
            ids: IdGenerator::global(),
            videos: CollectionSync::new(diagnostics.clone()),
            queries: CollectionSync::new(diagnostics.clone()),
            links: CollectionSync::new(diagnostics.clone()),
            diagnostics,
        }
    }

    /// Hydrate every collection concurrently and open their write gates.
    ///
    /// Never fails: a collection whose read fails starts empty and a
    /// [`Diagnostic`] is published. Safe to call again: a later call waits
    /// for the collections an earlier call is still reading, and retries any
    /// whose read was cancelled.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        tokio::join!(
            self.videos.hydrate(Arc::clone(&self.store)),
            self.queries.hydrate(Arc::clone(&self.store)),
            self.links.hydrate(Arc::clone(&self.store)),
        );
        info!(
            videos = self.videos.snapshot().len(),
            queries = self.queries.snapshot().len(),
            links = self.links.snapshot().len(),
            "Catalog ready"
        );
    }

    #[must_use]
    pub const fn videos(&self) -> &CollectionSync<Video> {
        &self.videos
    }

    #[must_use]
    pub const fn queries(&self) -> &CollectionSync<SavedQuery> {
        &self.queries
    }

    #[must_use]
    pub const fn links(&self) -> &CollectionSync<Link> {
        &self.links
    }

    /// Apply `intent` to the collection it names and queue the write.
    ///
    /// # Errors
    ///
    /// See [`CollectionSync::apply`].
    pub fn mutate(&self, intent: impl Into<Intent>) -> Result<CollectionSnapshot, SyncError> {
        match intent.into() {
            Intent::Video(intent) => self
                .videos
                .apply(intent, self.ids)
                .map(CollectionSnapshot::Videos),
            Intent::Query(intent) => self
                .queries
                .apply(intent, self.ids)
                .map(CollectionSnapshot::Queries),
            Intent::Link(intent) => self
                .links
                .apply(intent, self.ids)
                .map(CollectionSnapshot::Links),
        }
    }

    /// Import `candidates` at the head of the video collection and queue the
    /// write, reporting what was added and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotReady`] before the videos have been hydrated.
    pub fn import_videos(&self, candidates: &[VideoCandidate]) -> Result<ImportSummary, SyncError> {
        let (_, summary) = self.videos.apply_with(|current| {
            let outcome = import_videos(current, candidates, self.ids);
            let summary = ImportSummary {
                found: candidates.len(),
                added: outcome.added,
                skipped: outcome.skipped,
            };
            Ok((outcome.videos, summary))
        })?;
        Ok(summary)
    }

    #[must_use]
    pub fn snapshot(&self, collection: CollectionName) -> CollectionSnapshot {
        match collection {
            CollectionName::Videos => CollectionSnapshot::Videos(self.videos.snapshot()),
            CollectionName::Queries => CollectionSnapshot::Queries(self.queries.snapshot()),
            CollectionName::Links => CollectionSnapshot::Links(self.links.snapshot()),
        }
    }

    /// Revision watch for `collection`; changes on every new value.
    #[must_use]
    pub fn subscribe(&self, collection: CollectionName) -> watch::Receiver<u64> {
        match collection {
            CollectionName::Videos => self.videos.subscribe(),
            CollectionName::Queries => self.queries.subscribe(),
            CollectionName::Links => self.links.subscribe(),
        }
    }

    #[must_use]
    pub fn phase(&self, collection: CollectionName) -> SyncPhase {
        match collection {
            CollectionName::Videos => self.videos.phase(),
            CollectionName::Queries => self.queries.phase(),
            CollectionName::Links => self.links.phase(),
        }
    }

    #[must_use]
    pub fn watch_phase(&self, collection: CollectionName) -> watch::Receiver<SyncPhase> {
        match collection {
            CollectionName::Videos => self.videos.watch_phase(),
            CollectionName::Queries => self.queries.watch_phase(),
            CollectionName::Links => self.links.watch_phase(),
        }
    }

    /// Hydrate and persist failures from every collection.
    #[must_use]
    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// Wait for every queued write in every collection.
    pub async fn flush(&self) {
        tokio::join!(self.videos.flush(), self.queries.flush(), self.links.flush());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};
    use support_portal_core::{LinkDraft, LinkIntent, QueryDraft, QueryIntent, VideoDraft, VideoIntent};

    use super::*;
    use crate::store::{Document, MemoryStore, StoreError};

    /// Store whose reads and writes always fail.
    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        async fn get(&self, _: CollectionName) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn set(&self, _: CollectionName, _: Document) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    fn video_draft(url: &str) -> VideoDraft {
        VideoDraft {
            title: "Setting up the scanner".to_string(),
            description: "Step by step".to_string(),
            url: url.to_string(),
            category: None,
        }
    }

    #[tokio::test]
    async fn test_mutation_before_initialize_is_rejected() {
        let store = MemoryStore::new();
        let sync = CatalogSync::new(Arc::new(store.clone()));
        assert_eq!(sync.phase(CollectionName::Videos), SyncPhase::Uninitialized);

        let result = sync.mutate(VideoIntent::Add(video_draft(
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
        )));
        assert!(matches!(result, Err(SyncError::NotReady(CollectionName::Videos))));
        assert!(store.document(CollectionName::Videos).await.is_none());
    }

    #[tokio::test]
    async fn test_initialize_hydrates_existing_documents() {
        let store = MemoryStore::new();
        let Value::Object(document) = json!({
            "queries": [{ "id": "1", "title": "Refunds", "query": "status = 'refunded'" }]
        }) else {
            unreachable!()
        };
        store.insert(CollectionName::Queries, document).await;

        let sync = CatalogSync::new(Arc::new(store));
        sync.initialize().await;

        assert_eq!(sync.phase(CollectionName::Queries), SyncPhase::Ready);
        assert_eq!(sync.snapshot(CollectionName::Queries).len(), 1);
        assert!(sync.snapshot(CollectionName::Videos).is_empty());
        assert_eq!(sync.queries().revision(), 1);
    }

    #[tokio::test]
    async fn test_mutations_write_through() {
        let store = MemoryStore::new();
        let sync = CatalogSync::new(Arc::new(store.clone()));
        sync.initialize().await;

        sync.mutate(QueryIntent::Add(QueryDraft {
            title: "Open tickets".to_string(),
            query: "state = open".to_string(),
        }))
        .unwrap();
        sync.mutate(LinkIntent::Add(LinkDraft {
            title: "Status".to_string(),
            url: "https://status.polosys.com".to_string(),
            description: String::new(),
        }))
        .unwrap();
        sync.flush().await;

        let queries = store.document(CollectionName::Queries).await.unwrap();
        assert_eq!(queries["queries"][0]["title"], "Open tickets");
        let links = store.document(CollectionName::Links).await.unwrap();
        assert_eq!(links["links"][0]["url"], "https://status.polosys.com");
        assert!(store.document(CollectionName::Videos).await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_mutation_changes_nothing() {
        let store = MemoryStore::new();
        let sync = CatalogSync::new(Arc::new(store.clone()));
        sync.initialize().await;
        let before = sync.videos().revision();

        let result = sync.mutate(VideoIntent::Add(video_draft("https://example.com/not-a-video")));
        assert!(matches!(
            result,
            Err(SyncError::Rejected(CatalogError::InvalidSourceUrl(_)))
        ));
        sync.flush().await;
        assert_eq!(sync.videos().revision(), before);
        assert!(store.document(CollectionName::Videos).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_hydrate_starts_empty_and_reports() {
        let sync = CatalogSync::new(Arc::new(BrokenStore));
        let mut diagnostics = sync.subscribe_diagnostics();
        sync.initialize().await;

        for collection in CollectionName::ALL {
            assert_eq!(sync.phase(collection), SyncPhase::Ready);
            assert!(sync.snapshot(collection).is_empty());
        }
        let first = diagnostics.recv().await.unwrap();
        assert!(matches!(first, Diagnostic::HydrateFailed { .. }));

        // Still accepts mutations; the failed write is reported, not raised.
        sync.mutate(VideoIntent::Add(video_draft("https://youtu.be/dQw4w9WgXcQ")))
            .unwrap();
        sync.flush().await;
        assert_eq!(sync.snapshot(CollectionName::Videos).len(), 1);
        let mut persist_failures = 0;
        while let Ok(diagnostic) = diagnostics.try_recv() {
            if let Diagnostic::PersistFailed { collection, .. } = diagnostic {
                assert_eq!(collection, CollectionName::Videos);
                persist_failures += 1;
            }
        }
        assert_eq!(persist_failures, 1);
    }

    #[tokio::test]
    async fn test_initialize_twice_keeps_state() {
        let store = MemoryStore::new();
        let sync = CatalogSync::new(Arc::new(store));
        sync.initialize().await;
        sync.mutate(VideoIntent::Add(video_draft("https://youtu.be/dQw4w9WgXcQ")))
            .unwrap();
        sync.initialize().await;
        assert_eq!(sync.snapshot(CollectionName::Videos).len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_revisions() {
        let sync = CatalogSync::new(Arc::new(MemoryStore::new()));
        let mut revisions = sync.subscribe(CollectionName::Links);
        sync.initialize().await;
        revisions.changed().await.unwrap();
        assert_eq!(*revisions.borrow_and_update(), 1);

        sync.mutate(LinkIntent::Add(LinkDraft {
            title: "Docs".to_string(),
            url: "https://docs.polosys.com".to_string(),
            description: String::new(),
        }))
        .unwrap();
        revisions.changed().await.unwrap();
        assert_eq!(*revisions.borrow_and_update(), 2);
    }
}
