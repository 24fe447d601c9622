//! Remote document store seam.
//!
//! Each catalog collection is one document holding the whole collection as
//! an array under a field named after the collection. Reads and writes are
//! always whole-document; there is no query surface.

pub mod codec;
mod firestore;
mod memory;

pub use firestore::FirestoreClient;
pub use memory::MemoryStore;

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use support_portal_core::CollectionName;
use thiserror::Error;
use tracing::warn;

/// A stored document: top-level field name to JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Errors from the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed document: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Whole-document access to the store, keyed by collection.
///
/// Implementations own their timeout policy; callers never cancel an issued
/// request.
pub trait DocumentStore: Send + Sync + 'static {
    /// Read the document for `collection`. `Ok(None)` means it does not exist.
    fn get(
        &self,
        collection: CollectionName,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Replace the document for `collection` wholesale.
    fn set(
        &self,
        collection: CollectionName,
        document: Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Wrap a collection's items into its document.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if an item cannot be serialised.
pub fn encode_items<T: Serialize>(
    collection: CollectionName,
    items: &[T],
) -> Result<Document, StoreError> {
    let value = serde_json::to_value(items).map_err(|e| StoreError::Decode(e.to_string()))?;
    let mut document = Document::new();
    document.insert(collection.as_str().to_string(), value);
    Ok(document)
}

/// Read a collection's items out of its document.
///
/// A missing field decodes to an empty collection. Items that do not decode
/// are skipped with a warning so one bad record cannot hide the rest.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if the field is present but not an array.
pub fn decode_items<T: DeserializeOwned>(
    collection: CollectionName,
    document: &Document,
) -> Result<Vec<T>, StoreError> {
    let Some(field) = document.get(collection.as_str()) else {
        return Ok(Vec::new());
    };
    let Value::Array(entries) = field else {
        return Err(StoreError::Decode(format!(
            "field `{collection}` is not an array"
        )));
    };

    let items = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            serde_json::from_value(entry.clone())
                .map_err(|e| {
                    warn!(%collection, index, error = %e, "Skipping malformed record");
                })
                .ok()
        })
        .collect();
    Ok(items)
}
