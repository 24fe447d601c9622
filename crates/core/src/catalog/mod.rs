//! Catalog records and the pure mutators over them.
//!
//! Every mutator takes the current collection by reference and returns the
//! next value. A rejected mutation returns an error and leaves nothing
//! half-applied; the caller keeps its old collection.
//!
//! Ordering is the only structure a collection has: new records go to the
//! head, updates keep their position, deletes close the gap.

mod error;
pub mod filter;
pub mod link;
pub mod query;
pub mod video;

pub use error::CatalogError;
pub use filter::{Searchable, filter_by_text};
pub use link::{Link, LinkDraft, LinkIntent};
pub use query::{QueryDraft, QueryIntent, SavedQuery};
pub use video::{ImportOutcome, Video, VideoCandidate, VideoDraft, VideoIntent, import_videos};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{CollectionName, IdGenerator};

/// A record that lives in one of the synchronised collections.
pub trait CatalogRecord:
    Clone + core::fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Record id type; each collection has its own id space.
    type Id: Clone + PartialEq + core::fmt::Display + Send + Sync;

    /// Mutation intents accepted by this collection.
    type Intent: Send;

    /// The collection this record belongs to.
    const COLLECTION: CollectionName;

    /// The record's id.
    fn id(&self) -> &Self::Id;

    /// Compute the next collection value for `intent`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for validation failures and updates of
    /// missing ids. The input collection is never modified.
    fn apply(
        existing: &[Self],
        intent: Self::Intent,
        ids: &IdGenerator,
    ) -> Result<Vec<Self>, CatalogError>;
}

/// A mutation addressed to a collection by name.
#[derive(Debug, Clone)]
pub enum Intent {
    Video(VideoIntent),
    Query(QueryIntent),
    Link(LinkIntent),
}

impl Intent {
    /// The collection this intent targets.
    #[must_use]
    pub const fn collection(&self) -> CollectionName {
        match self {
            Self::Video(_) => CollectionName::Videos,
            Self::Query(_) => CollectionName::Queries,
            Self::Link(_) => CollectionName::Links,
        }
    }
}

impl From<VideoIntent> for Intent {
    fn from(intent: VideoIntent) -> Self {
        Self::Video(intent)
    }
}

impl From<QueryIntent> for Intent {
    fn from(intent: QueryIntent) -> Self {
        Self::Query(intent)
    }
}

impl From<LinkIntent> for Intent {
    fn from(intent: LinkIntent) -> Self {
        Self::Link(intent)
    }
}

/// Prepend `record`, keeping the rest of the collection in order.
fn prepend<T: Clone>(existing: &[T], record: T) -> Vec<T> {
    let mut next = Vec::with_capacity(existing.len() + 1);
    next.push(record);
    next.extend_from_slice(existing);
    next
}

/// Replace the record with `id` in place.
///
/// Returns `None` if no record has that id.
fn replace_by_id<T, F>(existing: &[T], id: &T::Id, update: F) -> Option<Vec<T>>
where
    T: CatalogRecord,
    F: FnOnce(&T) -> T,
{
    let position = existing.iter().position(|record| record.id() == id)?;
    let mut next = existing.to_vec();
    if let Some(slot) = next.get_mut(position) {
        *slot = update(slot);
    }
    Some(next)
}

/// Remove every record with `id`. An absent id leaves the collection as is.
fn remove_by_id<T: CatalogRecord>(existing: &[T], id: &T::Id) -> Vec<T> {
    existing
        .iter()
        .filter(|record| record.id() != id)
        .cloned()
        .collect()
}

/// Trimmed copy of a required form field.
fn required(field: &'static str, value: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}
