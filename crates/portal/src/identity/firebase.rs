//! Firebase Authentication REST client (Identity Toolkit).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use support_portal_core::Email;
use tracing::{debug, instrument, warn};

use super::{AuthError, AuthSession, BearerToken, IdentityProvider};
use crate::config::FirebaseConfig;

/// Token lifetime Firebase uses when the response omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Email/password sign-in against Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    inner: Arc<FirebaseAuthClientInner>,
}

struct FirebaseAuthClientInner {
    client: Client,
    sign_in_url: String,
    api_key: SecretString,
    token: BearerToken,
}

impl std::fmt::Debug for FirebaseAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuthClient")
            .field("sign_in_url", &self.inner.sign_in_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Request body for `accounts:signInWithPassword`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Successful sign-in response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Token lifetime in seconds, as a decimal string.
    #[serde(default)]
    expires_in: Option<String>,
}

/// Error envelope returned by the Identity Toolkit.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl FirebaseAuthClient {
    /// Create a client that publishes its id token into `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &FirebaseConfig,
        timeout: Duration,
        token: BearerToken,
    ) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base = config.auth_base_url.as_str().trim_end_matches('/');
        Ok(Self {
            inner: Arc::new(FirebaseAuthClientInner {
                client,
                sign_in_url: format!("{base}/accounts:signInWithPassword"),
                api_key: config.api_key.clone(),
                token,
            }),
        })
    }
}

/// Map an Identity Toolkit error code to an [`AuthError`].
///
/// Messages look like `INVALID_PASSWORD` or
/// `TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been ...`.
fn classify_error(message: &str) -> AuthError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthError::InvalidCredentials
        }
        "USER_DISABLED" => AuthError::Disabled,
        _ => AuthError::Provider(message.to_string()),
    }
}

impl IdentityProvider for FirebaseAuthClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let now = Utc::now();

        let response = self
            .inner
            .client
            .post(&self.inner.sign_in_url)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(&SignInRequest {
                email: email.as_str(),
                password: password.expose_secret(),
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body: SignInResponse = response.json().await?;
            let lifetime = body
                .expires_in
                .as_deref()
                .and_then(|secs| secs.parse::<i64>().ok())
                .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
            let id_token = SecretString::from(body.id_token);

            self.inner.token.set(id_token.clone()).await;
            debug!(uid = %body.local_id, "Signed in");

            Ok(AuthSession {
                uid: body.local_id,
                email: email.clone(),
                id_token,
                refresh_token: body.refresh_token.map(SecretString::from),
                expires_at: now + chrono::Duration::seconds(lifetime),
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error = serde_json::from_str::<ErrorEnvelope>(&error_text).map_or_else(
                |_| AuthError::Provider(format!("HTTP {status}: {error_text}")),
                |envelope| classify_error(&envelope.error.message),
            );

            if !error.is_credential_error() {
                warn!(%status, error = %error, "Sign-in failed");
            }
            Err(error)
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        // Firebase id tokens are stateless; dropping ours ends the session.
        self.inner.token.clear().await;
        Ok(())
    }
}
