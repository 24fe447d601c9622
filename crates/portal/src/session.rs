//! Session gate.
//!
//! `LoggedOut -> (valid credentials) -> LoggedIn -> (sign out) -> LoggedOut`.
//! A failed sign-in leaves the gate logged out with a transient error
//! message. The cached admin hint only pre-selects the view at launch; store
//! mutations need a live, unexpired provider session.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::SecretString;
use support_portal_core::{AppView, Email};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::identity::{AuthError, AuthSession, IdentityProvider};

/// Contents of the hint file while an admin is signed in.
const HINT_ADMIN: &str = "adminLoggedIn=true";

/// Current authentication state.
#[derive(Debug, Clone)]
pub enum SessionState {
    LoggedOut {
        /// Message from the last failed sign-in, if any.
        error: Option<String>,
    },
    LoggedIn(AuthSession),
}

impl Default for SessionState {
    fn default() -> Self {
        Self::LoggedOut { error: None }
    }
}

impl SessionState {
    /// The session, if signed in and not expired.
    #[must_use]
    pub fn active(&self) -> Option<&AuthSession> {
        match self {
            Self::LoggedIn(session) if !session.is_expired() => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::LoggedOut { error } => error.as_deref(),
            Self::LoggedIn(_) => None,
        }
    }
}

/// Locally cached "last known admin" flag.
///
/// Backed by a small file when a path is configured, otherwise kept in
/// memory for the life of the process. Not a trust boundary.
#[derive(Debug)]
pub struct SessionHint {
    path: Option<PathBuf>,
    admin: AtomicBool,
}

impl SessionHint {
    /// A hint that is never written to disk.
    #[must_use]
    pub const fn in_memory() -> Self {
        Self {
            path: None,
            admin: AtomicBool::new(false),
        }
    }

    /// Load the hint from `path`. A missing or unreadable file means "not admin".
    pub async fn load(path: Option<PathBuf>) -> Self {
        let admin = match &path {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(contents) => contents.trim() == HINT_ADMIN,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read session hint");
                    false
                }
            },
            None => false,
        };
        Self {
            path,
            admin: AtomicBool::new(admin),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.admin.load(Ordering::Relaxed)
    }

    /// Record the flag. File errors are logged and otherwise ignored.
    pub async fn set(&self, admin: bool) {
        self.admin.store(admin, Ordering::Relaxed);
        let Some(path) = &self.path else {
            return;
        };

        let result = if admin {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = tokio::fs::create_dir_all(parent).await
            {
                warn!(path = %path.display(), error = %e, "Failed to create session hint directory");
            }
            tokio::fs::write(path, HINT_ADMIN).await
        } else {
            match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        };

        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to update session hint");
        }
    }
}

/// Signs the administrator in and out and publishes the session state.
pub struct SessionGate<I> {
    identity: Arc<I>,
    state: watch::Sender<SessionState>,
    hint: SessionHint,
}

impl<I> std::fmt::Debug for SessionGate<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("state", &*self.state.borrow())
            .field("hint", &self.hint)
            .finish_non_exhaustive()
    }
}

impl<I: IdentityProvider> SessionGate<I> {
    #[must_use]
    pub fn new(identity: Arc<I>, hint: SessionHint) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            identity,
            state,
            hint,
        }
    }

    /// View to show at launch, from the cached hint.
    #[must_use]
    pub fn initial_view(&self) -> AppView {
        if self.hint.is_admin() {
            AppView::Admin
        } else {
            AppView::Customer
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The live session, if signed in and not expired.
    #[must_use]
    pub fn active_session(&self) -> Option<AuthSession> {
        self.state.borrow().active().cloned()
    }

    /// Sign in with email and password. One attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`]; the gate stays logged out and records the
    /// message for display.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let result = match Email::parse(email) {
            Ok(email) => self.identity.sign_in(&email, password).await,
            Err(e) => Err(AuthError::from(e)),
        };

        match result {
            Ok(session) => {
                info!(uid = %session.uid, "Admin signed in");
                self.state.send_replace(SessionState::LoggedIn(session));
                self.hint.set(true).await;
                Ok(())
            }
            Err(e) => {
                self.state.send_if_modified(|state| match state {
                    SessionState::LoggedOut { error } => {
                        *error = Some(e.to_string());
                        true
                    }
                    SessionState::LoggedIn(_) => false,
                });
                Err(e)
            }
        }
    }

    /// Sign out. The gate is logged out afterwards even if the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AuthError`] after the local state is cleared.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.identity.sign_out().await;
        self.state.send_replace(SessionState::default());
        self.hint.set(false).await;
        info!("Admin signed out");
        result
    }

    /// Dismiss the sign-in error message.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| match state {
            SessionState::LoggedOut { error } => error.take().is_some(),
            SessionState::LoggedIn(_) => false,
        });
    }
}
