//! In-process document store.

use std::collections::HashMap;
use std::sync::Arc;

use support_portal_core::CollectionName;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, StoreError};

/// Document store held in memory.
///
/// Clones share the same documents, so a test can keep a handle and inspect
/// what the sync layer wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<CollectionName, Document>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document before the store is handed out.
    pub async fn insert(&self, collection: CollectionName, document: Document) {
        self.documents.write().await.insert(collection, document);
    }

    /// Current document for `collection`, if any.
    pub async fn document(&self, collection: CollectionName) -> Option<Document> {
        self.documents.read().await.get(&collection).cloned()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: CollectionName) -> Result<Option<Document>, StoreError> {
        Ok(self.document(collection).await)
    }

    async fn set(&self, collection: CollectionName, document: Document) -> Result<(), StoreError> {
        self.insert(collection, document).await;
        Ok(())
    }
}
