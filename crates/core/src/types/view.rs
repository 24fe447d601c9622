//! Portal views and catalog collection names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which top-level view the portal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppView {
    /// Public video library with search.
    #[default]
    Customer,
    /// Catalog management for a signed-in administrator.
    Admin,
}

/// The three independently synchronised catalog collections.
///
/// The name doubles as the remote document id and as the name of the array
/// field inside that document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionName {
    Videos,
    Queries,
    Links,
}

/// Error returned when a string does not name a collection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown collection: {0} (expected videos, queries or links)")]
pub struct UnknownCollection(pub String);

impl CollectionName {
    /// Every collection, in hydration order.
    pub const ALL: [Self; 3] = [Self::Videos, Self::Queries, Self::Links];

    /// Document id and field name for this collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Queries => "queries",
            Self::Links => "links",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CollectionName {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "videos" => Ok(Self::Videos),
            "queries" => Ok(Self::Queries),
            "links" => Ok(Self::Links),
            _ => Err(UnknownCollection(s.to_owned())),
        }
    }
}
