//! Integration tests for the support portal.
//!
//! # Running Tests
//!
//! ```bash
//! # Everything that runs against in-process doubles
//! cargo test -p support-portal-integration-tests
//!
//! # Live tests against the Firebase emulator suite
//! firebase emulators:start --only auth,firestore
//! FIRESTORE_BASE_URL=http://127.0.0.1:8080/v1 \
//! FIREBASE_AUTH_BASE_URL=http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1 \
//!     cargo test -p support-portal-integration-tests -- --ignored
//! ```
//!
//! This library holds the store and identity doubles the tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use support_portal::identity::{AuthError, AuthSession, IdentityProvider};
use support_portal::session::SessionHint;
use support_portal::store::{Document, DocumentStore, MemoryStore, StoreError};
use support_portal::Portal;
use support_portal_core::{CollectionName, Email, LinkDraft, QueryDraft, VideoDraft};
use tokio::sync::{Mutex, watch};

pub const ADMIN_EMAIL: &str = "admin@polosys.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

// =============================================================================
// Fixtures
// =============================================================================

/// Turn a JSON object literal into a [`Document`].
///
/// # Panics
///
/// Panics if `value` is not an object.
#[must_use]
pub fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[must_use]
pub fn video_draft(title: &str, url: &str) -> VideoDraft {
    VideoDraft {
        title: title.to_string(),
        description: format!("{title} walkthrough"),
        url: url.to_string(),
        category: None,
    }
}

#[must_use]
pub fn query_draft(title: &str, query: &str) -> QueryDraft {
    QueryDraft {
        title: title.to_string(),
        query: query.to_string(),
    }
}

#[must_use]
pub fn link_draft(title: &str, url: &str) -> LinkDraft {
    LinkDraft {
        title: title.to_string(),
        url: url.to_string(),
        description: String::new(),
    }
}

/// A portal over `store` with the scripted admin identity and no hint file.
#[must_use]
pub fn portal<S: DocumentStore>(store: S) -> Portal<S, ScriptedIdentity> {
    Portal::new(
        Arc::new(store),
        Arc::new(ScriptedIdentity::new()),
        SessionHint::in_memory(),
    )
}

// =============================================================================
// Recording store
// =============================================================================

/// A store call, in the order it was made.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get(CollectionName),
    Set(CollectionName, Document),
}

/// In-memory store that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls against an existing store.
    #[must_use]
    pub fn backed_by(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: Arc::default(),
        }
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    /// Documents written for `collection`, oldest first.
    pub async fn writes(&self, collection: CollectionName) -> Vec<Document> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                StoreCall::Set(c, document) if *c == collection => Some(document.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DocumentStore for RecordingStore {
    async fn get(&self, collection: CollectionName) -> Result<Option<Document>, StoreError> {
        self.calls.lock().await.push(StoreCall::Get(collection));
        self.inner.get(collection).await
    }

    async fn set(&self, collection: CollectionName, document: Document) -> Result<(), StoreError> {
        self.calls
            .lock()
            .await
            .push(StoreCall::Set(collection, document.clone()));
        self.inner.set(collection, document).await
    }
}

// =============================================================================
// Gated store
// =============================================================================

/// Store whose reads block until released, and which counts writes that
/// arrive for a collection whose read has not resolved yet.
#[derive(Debug, Clone)]
pub struct GatedStore {
    inner: MemoryStore,
    gates: Arc<HashMap<CollectionName, watch::Sender<bool>>>,
    resolved: Arc<Mutex<HashSet<CollectionName>>>,
    early_writes: Arc<AtomicUsize>,
}

impl Default for GatedStore {
    fn default() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl GatedStore {
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        let gates = CollectionName::ALL
            .into_iter()
            .map(|collection| (collection, watch::channel(false).0))
            .collect();
        Self {
            inner,
            gates: Arc::new(gates),
            resolved: Arc::default(),
            early_writes: Arc::default(),
        }
    }

    /// Let reads of `collection` complete.
    pub fn release(&self, collection: CollectionName) {
        if let Some(gate) = self.gates.get(&collection) {
            gate.send_replace(true);
        }
    }

    /// Writes observed before the read of the same collection resolved.
    #[must_use]
    pub fn early_writes(&self) -> usize {
        self.early_writes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryStore {
        &self.inner
    }
}

impl DocumentStore for GatedStore {
    async fn get(&self, collection: CollectionName) -> Result<Option<Document>, StoreError> {
        if let Some(gate) = self.gates.get(&collection) {
            let mut open = gate.subscribe();
            open.wait_for(|open| *open)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        let document = self.inner.get(collection).await;
        self.resolved.lock().await.insert(collection);
        document
    }

    async fn set(&self, collection: CollectionName, document: Document) -> Result<(), StoreError> {
        if !self.resolved.lock().await.contains(&collection) {
            self.early_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.set(collection, document).await
    }
}

// =============================================================================
// Failing store
// =============================================================================

/// Store whose reads and/or writes fail, counting every attempt.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: bool,
    fail_writes: bool,
    write_attempts: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Reads fail; writes succeed.
    #[must_use]
    pub fn unreadable(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Reads succeed; writes fail.
    #[must_use]
    pub fn unwritable(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_writes: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryStore {
        &self.inner
    }
}

impl DocumentStore for FailingStore {
    async fn get(&self, collection: CollectionName) -> Result<Option<Document>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Status {
                status: 503,
                message: "The service is currently unavailable.".to_string(),
            });
        }
        self.inner.get(collection).await
    }

    async fn set(&self, collection: CollectionName, document: Document) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StoreError::Status {
                status: 403,
                message: "Missing or insufficient permissions.".to_string(),
            });
        }
        self.inner.set(collection, document).await
    }
}

// =============================================================================
// Slow store
// =============================================================================

/// Store whose writes take a scripted amount of time each.
///
/// Tracks how many writes were ever in flight at once and the order in
/// which they completed.
#[derive(Debug, Clone, Default)]
pub struct SlowStore {
    inner: MemoryStore,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    completed: Arc<Mutex<Vec<Document>>>,
}

impl SlowStore {
    /// Writes take `delays` in turn, then complete immediately.
    #[must_use]
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: Arc::new(Mutex::new(delays.into_iter().collect())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Documents in the order their writes finished.
    pub async fn completed(&self) -> Vec<Document> {
        self.completed.lock().await.clone()
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryStore {
        &self.inner
    }
}

impl DocumentStore for SlowStore {
    async fn get(&self, collection: CollectionName) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection).await
    }

    async fn set(&self, collection: CollectionName, document: Document) -> Result<(), StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.lock().await.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.completed.lock().await.push(document.clone());
        let result = self.inner.set(collection, document).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// =============================================================================
// Scripted identity
// =============================================================================

/// Identity provider that accepts exactly [`ADMIN_EMAIL`] / [`ADMIN_PASSWORD`].
#[derive(Debug, Default)]
pub struct ScriptedIdentity {
    sign_in_attempts: AtomicUsize,
    sign_outs: AtomicUsize,
    /// Lifetime of issued sessions; `None` issues one-hour sessions.
    session_lifetime: Option<chrono::Duration>,
}

impl ScriptedIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue sessions that expire after `lifetime`.
    #[must_use]
    pub fn with_session_lifetime(lifetime: chrono::Duration) -> Self {
        Self {
            session_lifetime: Some(lifetime),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sign_in_attempts(&self) -> usize {
        self.sign_in_attempts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for ScriptedIdentity {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        self.sign_in_attempts.fetch_add(1, Ordering::SeqCst);
        if email.as_str() != ADMIN_EMAIL || password.expose_secret() != ADMIN_PASSWORD {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(AuthSession {
            uid: "admin-uid".to_string(),
            email: email.clone(),
            id_token: SecretString::from("scripted-id-token"),
            refresh_token: None,
            expires_at: Utc::now()
                + self
                    .session_lifetime
                    .unwrap_or_else(|| chrono::Duration::hours(1)),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
