//! Identity provider seam: email/password sign-in and sign-out.

mod firebase;

pub use firebase::FirebaseAuthClient;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use support_portal_core::{Email, EmailError};
use thiserror::Error;
use tokio::sync::RwLock;

/// Seconds before expiry at which a session is already treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Account is disabled")]
    Disabled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Whether the user can fix this by re-entering credentials.
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::InvalidEmail(_) | Self::Disabled
        )
    }
}

/// A live session issued by the identity provider.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Provider user id.
    pub uid: String,
    pub email: Email,
    /// Bearer token for store requests.
    pub id_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Check if the id token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

/// Remote email/password identity provider.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Single sign-in attempt. Never retried.
    fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<AuthSession, AuthError>> + Send;

    /// End the provider session.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Id token shared between the identity client and the store client.
///
/// The identity client fills it on sign-in and clears it on sign-out; the
/// store client attaches it to every request while it is set.
#[derive(Clone, Default)]
pub struct BearerToken(Arc<RwLock<Option<SecretString>>>);

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

impl BearerToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: SecretString) {
        *self.0.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.0.write().await = None;
    }

    pub async fn get(&self) -> Option<SecretString> {
        self.0.read().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn session(expires_in: i64) -> AuthSession {
        AuthSession {
            uid: "uid-1".to_string(),
            email: Email::parse("admin@polosys.com").unwrap(),
            id_token: SecretString::from("token"),
            refresh_token: None,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn test_session_expiry() {
        assert!(!session(3600).is_expired());
        assert!(session(30).is_expired());
        assert!(session(-10).is_expired());
    }

    #[test]
    fn test_credential_errors() {
        assert!(AuthError::InvalidCredentials.is_credential_error());
        assert!(AuthError::InvalidEmail(EmailError::Empty).is_credential_error());
        assert!(!AuthError::Provider("QUOTA_EXCEEDED".to_string()).is_credential_error());
    }

    #[tokio::test]
    async fn test_bearer_token_shared_between_clones() {
        let token = BearerToken::new();
        let store_side = token.clone();
        assert!(store_side.get().await.is_none());

        token.set(SecretString::from("id-token")).await;
        assert_eq!(store_side.get().await.unwrap().expose_secret(), "id-token");

        token.clear().await;
        assert!(store_side.get().await.is_none());
    }

    #[test]
    fn test_bearer_token_debug_redacted() {
        assert_eq!(format!("{:?}", BearerToken::new()), "BearerToken(\"[REDACTED]\")");
    }
}
