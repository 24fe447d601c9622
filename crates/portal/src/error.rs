//! Unified error handling for the portal.

use thiserror::Error;

use crate::config::ConfigError;
use crate::identity::AuthError;
use crate::search::SearchError;
use crate::store::StoreError;
use crate::sync::SyncError;

/// Portal-level error type.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store client could not be built.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Sign-in or sign-out failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Mutation was rejected or arrived too early.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Channel search failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// A store mutation was attempted without a live session.
    #[error("Sign in as an administrator first")]
    NotSignedIn,
}

impl PortalError {
    /// Whether the user caused this and can correct it.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        match self {
            Self::Auth(e) => e.is_credential_error(),
            Self::Sync(SyncError::Rejected(_)) | Self::NotSignedIn => true,
            _ => false,
        }
    }
}
