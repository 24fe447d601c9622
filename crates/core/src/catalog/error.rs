//! Catalog mutation errors.

use thiserror::Error;

use crate::types::{CollectionName, WebUrlError};

/// Why a mutation was rejected.
///
/// Validation errors and not-found errors both block the mutation entirely:
/// the caller's collection is unchanged and nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The source URL does not contain an 11-character video id.
    #[error("invalid video URL: {0}")]
    InvalidSourceUrl(String),

    /// A link URL is not well-formed.
    #[error("invalid link URL: {0}")]
    InvalidLinkUrl(#[from] WebUrlError),

    /// A required field was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Update of a record that is not in the collection.
    #[error("no {collection} record with id {id}")]
    NotFound {
        /// Collection that was searched.
        collection: CollectionName,
        /// Id that was not found.
        id: String,
    },
}

impl CatalogError {
    /// Returns `true` for errors caused by bad input rather than a missing
    /// record.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}
