//! Portal state: the catalog and the session gate over injected clients.

use std::sync::Arc;

use support_portal_core::{AppView, CollectionName, Intent};
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::identity::{BearerToken, FirebaseAuthClient, IdentityProvider};
use crate::search::VideoSearchProvider;
use crate::session::{SessionGate, SessionHint};
use crate::store::{DocumentStore, FirestoreClient};
use crate::sync::{CatalogSync, CollectionSnapshot, Diagnostic, ImportSummary, SyncPhase};

/// Portal wired to Firestore and Firebase Authentication.
pub type FirebasePortal = Portal<FirestoreClient, FirebaseAuthClient>;

/// Shared portal state.
///
/// Cheap to clone; clones share the catalog and the session.
pub struct Portal<S, I> {
    inner: Arc<PortalInner<S, I>>,
}

struct PortalInner<S, I> {
    catalog: CatalogSync<S>,
    session: SessionGate<I>,
}

impl<S, I> Clone for Portal<S, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, I> std::fmt::Debug for Portal<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("catalog", &self.inner.catalog)
            .field("session", &self.inner.session)
            .finish()
    }
}

impl FirebasePortal {
    /// Build the Firebase clients from configuration.
    ///
    /// Both clients share one bearer token slot, so store requests carry the
    /// id token of whoever is signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub async fn from_config(config: &PortalConfig) -> Result<Self, PortalError> {
        let token = BearerToken::new();
        let store = FirestoreClient::new(&config.firebase, config.request_timeout, token.clone())?;
        let identity = FirebaseAuthClient::new(&config.firebase, config.request_timeout, token)?;
        let hint = SessionHint::load(config.session_hint_path.clone()).await;
        Ok(Self::new(Arc::new(store), Arc::new(identity), hint))
    }
}

impl<S: DocumentStore, I: IdentityProvider> Portal<S, I> {
    #[must_use]
    pub fn new(store: Arc<S>, identity: Arc<I>, hint: SessionHint) -> Self {
        Self {
            inner: Arc::new(PortalInner {
                catalog: CatalogSync::new(store),
                session: SessionGate::new(identity, hint),
            }),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogSync<S> {
        &self.inner.catalog
    }

    #[must_use]
    pub fn session(&self) -> &SessionGate<I> {
        &self.inner.session
    }

    /// Hydrate the catalog. Mutations are rejected until this completes.
    pub async fn initialize(&self) {
        self.inner.catalog.initialize().await;
    }

    /// View to open at launch.
    #[must_use]
    pub fn initial_view(&self) -> AppView {
        self.inner.session.initial_view()
    }

    #[must_use]
    pub fn get_collection(&self, collection: CollectionName) -> CollectionSnapshot {
        self.inner.catalog.snapshot(collection)
    }

    #[must_use]
    pub fn subscribe(&self, collection: CollectionName) -> watch::Receiver<u64> {
        self.inner.catalog.subscribe(collection)
    }

    #[must_use]
    pub fn phase(&self, collection: CollectionName) -> SyncPhase {
        self.inner.catalog.phase(collection)
    }

    #[must_use]
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.inner.catalog.subscribe_diagnostics()
    }

    /// Apply an admin mutation.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NotSignedIn`] without a live session, otherwise
    /// whatever the catalog rejects the intent with.
    #[instrument(skip(self, intent), fields(collection = %intent.collection()))]
    pub fn mutate(&self, intent: Intent) -> Result<CollectionSnapshot, PortalError> {
        if self.inner.session.active_session().is_none() {
            return Err(PortalError::NotSignedIn);
        }
        Ok(self.inner.catalog.mutate(intent)?)
    }

    /// Search the channel and import every new match at the head of the
    /// video collection.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NotSignedIn`] without a live session, or the
    /// search provider's error.
    #[instrument(skip(self, provider))]
    pub async fn import_videos<P: VideoSearchProvider>(
        &self,
        provider: &P,
        query: &str,
    ) -> Result<ImportSummary, PortalError> {
        if self.inner.session.active_session().is_none() {
            return Err(PortalError::NotSignedIn);
        }

        let candidates = provider.search(query).await?;
        // The session may have ended while the search ran.
        if self.inner.session.active_session().is_none() {
            return Err(PortalError::NotSignedIn);
        }
        let summary = self.inner.catalog.import_videos(&candidates)?;
        info!(
            found = summary.found,
            added = summary.added,
            skipped = summary.skipped,
            "Imported channel videos"
        );
        Ok(summary)
    }

    /// Wait for every queued write.
    pub async fn flush(&self) {
        self.inner.catalog.flush().await;
    }
}
