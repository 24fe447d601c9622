//! Reference links.

use serde::{Deserialize, Serialize};

use super::{CatalogError, CatalogRecord, prepend, remove_by_id, replace_by_id, required};
use crate::types::{CollectionName, IdGenerator, LinkId, WebUrl};

/// A reference link shown to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Admin form input for a link. The description may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDraft {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl LinkDraft {
    fn validate(&self) -> Result<(String, WebUrl, String), CatalogError> {
        let title = required("title", &self.title)?;
        let url = WebUrl::parse(&self.url)?;
        Ok((title, url, self.description.trim().to_owned()))
    }
}

/// Mutations accepted by the link collection.
#[derive(Debug, Clone)]
pub enum LinkIntent {
    Add(LinkDraft),
    Update { id: LinkId, draft: LinkDraft },
    Delete(LinkId),
}

impl CatalogRecord for Link {
    type Id = LinkId;
    type Intent = LinkIntent;

    const COLLECTION: CollectionName = CollectionName::Links;

    fn id(&self) -> &LinkId {
        &self.id
    }

    fn apply(
        existing: &[Self],
        intent: LinkIntent,
        ids: &IdGenerator,
    ) -> Result<Vec<Self>, CatalogError> {
        match intent {
            LinkIntent::Add(draft) => add_link(existing, &draft, ids),
            LinkIntent::Update { id, draft } => update_link(existing, &id, &draft),
            LinkIntent::Delete(id) => Ok(delete_link(existing, &id)),
        }
    }
}

/// Add a link at the head of the collection.
///
/// # Errors
///
/// Returns [`CatalogError::MissingField`] for an empty title or
/// [`CatalogError::InvalidLinkUrl`] for a malformed URL.
pub fn add_link(
    existing: &[Link],
    draft: &LinkDraft,
    ids: &IdGenerator,
) -> Result<Vec<Link>, CatalogError> {
    let (title, url, description) = draft.validate()?;
    Ok(prepend(
        existing,
        Link {
            id: ids.next_id(),
            title,
            url: url.into_inner(),
            description,
        },
    ))
}

/// Replace a link's fields in place.
///
/// # Errors
///
/// Returns the validation errors of [`add_link`] or
/// [`CatalogError::NotFound`] if `id` is not in the collection.
pub fn update_link(
    existing: &[Link],
    id: &LinkId,
    draft: &LinkDraft,
) -> Result<Vec<Link>, CatalogError> {
    let (title, url, description) = draft.validate()?;
    replace_by_id(existing, id, |current| Link {
        id: current.id.clone(),
        title,
        url: url.into_inner(),
        description,
    })
    .ok_or_else(|| CatalogError::NotFound {
        collection: CollectionName::Links,
        id: id.to_string(),
    })
}

/// Remove a link. Absent ids are ignored.
#[must_use]
pub fn delete_link(existing: &[Link], id: &LinkId) -> Vec<Link> {
    remove_by_id(existing, id)
}
