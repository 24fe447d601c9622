//! Saved reference queries.

use serde::{Deserialize, Serialize};

use super::{CatalogError, CatalogRecord, prepend, remove_by_id, replace_by_id, required};
use crate::types::{CollectionName, IdGenerator, QueryId};

/// A saved reference query. `query` is free text and is never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: QueryId,
    pub title: String,
    pub query: String,
}

/// Admin form input for a saved query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDraft {
    pub title: String,
    pub query: String,
}

impl QueryDraft {
    fn validate(&self) -> Result<(String, String), CatalogError> {
        let title = required("title", &self.title)?;
        // Query text keeps its inner formatting; only emptiness is checked.
        if self.query.trim().is_empty() {
            return Err(CatalogError::MissingField("query"));
        }
        Ok((title, self.query.clone()))
    }
}

/// Mutations accepted by the saved-query collection.
#[derive(Debug, Clone)]
pub enum QueryIntent {
    Add(QueryDraft),
    Update { id: QueryId, draft: QueryDraft },
    Delete(QueryId),
}

impl CatalogRecord for SavedQuery {
    type Id = QueryId;
    type Intent = QueryIntent;

    const COLLECTION: CollectionName = CollectionName::Queries;

    fn id(&self) -> &QueryId {
        &self.id
    }

    fn apply(
        existing: &[Self],
        intent: QueryIntent,
        ids: &IdGenerator,
    ) -> Result<Vec<Self>, CatalogError> {
        match intent {
            QueryIntent::Add(draft) => add_query(existing, &draft, ids),
            QueryIntent::Update { id, draft } => update_query(existing, &id, &draft),
            QueryIntent::Delete(id) => Ok(delete_query(existing, &id)),
        }
    }
}

/// Add a saved query at the head of the collection.
///
/// # Errors
///
/// Returns [`CatalogError::MissingField`] for an empty title or query.
pub fn add_query(
    existing: &[SavedQuery],
    draft: &QueryDraft,
    ids: &IdGenerator,
) -> Result<Vec<SavedQuery>, CatalogError> {
    let (title, query) = draft.validate()?;
    Ok(prepend(
        existing,
        SavedQuery {
            id: ids.next_id(),
            title,
            query,
        },
    ))
}

/// Replace a saved query's fields in place.
///
/// # Errors
///
/// Returns [`CatalogError::MissingField`] for empty fields or
/// [`CatalogError::NotFound`] if `id` is not in the collection.
pub fn update_query(
    existing: &[SavedQuery],
    id: &QueryId,
    draft: &QueryDraft,
) -> Result<Vec<SavedQuery>, CatalogError> {
    let (title, query) = draft.validate()?;
    replace_by_id(existing, id, |current| SavedQuery {
        id: current.id.clone(),
        title,
        query,
    })
    .ok_or_else(|| CatalogError::NotFound {
        collection: CollectionName::Queries,
        id: id.to_string(),
    })
}

/// Remove a saved query. Absent ids are ignored.
#[must_use]
pub fn delete_query(existing: &[SavedQuery], id: &QueryId) -> Vec<SavedQuery> {
    remove_by_id(existing, id)
}
