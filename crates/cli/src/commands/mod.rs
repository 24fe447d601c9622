//! CLI command implementations.
//!
//! Read-only commands hydrate the catalog and print it. Mutating commands
//! sign in first, refuse to write over a collection that failed to load,
//! and wait for the write before exiting.

pub mod links;
pub mod queries;
pub mod session;
pub mod videos;

use secrecy::SecretString;
use serde_json::Value;
use support_portal::sync::Diagnostic;
use support_portal::{FirebasePortal, PortalConfig, PortalError};
use support_portal_core::CollectionName;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// The collection could not be read, so writing it would drop its contents.
    #[error("{0}; refusing to overwrite it")]
    HydrateFailed(Diagnostic),

    /// The store rejected the write; the change is lost.
    #[error("{0}")]
    PersistFailed(Diagnostic),

    #[error("No {collection} record with id {id}")]
    UnknownId {
        collection: CollectionName,
        id: String,
    },

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Admin credentials from the command line or environment.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// How records are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print one line per record, or a JSON array of all records.
    #[allow(clippy::print_stdout)]
    pub fn records<T: serde::Serialize>(
        self,
        records: &[&T],
        line: impl Fn(&T) -> String,
    ) -> Result<(), CommandError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(records)?);
        } else if records.is_empty() {
            println!("(none)");
        } else {
            for record in records {
                println!("{}", line(record));
            }
        }
        Ok(())
    }

    /// Print a single record.
    #[allow(clippy::print_stdout)]
    pub fn record<T: serde::Serialize>(
        self,
        record: &T,
        line: impl Fn(&T) -> String,
    ) -> Result<(), CommandError> {
        if self.json {
            let value: Value = serde_json::to_value(record)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{}", line(record));
        }
        Ok(())
    }
}

/// An initialised portal plus the diagnostics it has published.
pub struct Workspace {
    pub portal: FirebasePortal,
    diagnostics: broadcast::Receiver<Diagnostic>,
}

impl Workspace {
    /// Hydrate the catalog for reading.
    pub async fn open(config: &PortalConfig) -> Result<Self, CommandError> {
        let portal = FirebasePortal::from_config(config).await?;
        let diagnostics = portal.diagnostics();
        portal.initialize().await;

        let mut workspace = Self {
            portal,
            diagnostics,
        };
        for diagnostic in workspace.drain() {
            tracing::warn!(%diagnostic, "Catalog loaded with errors");
        }
        Ok(workspace)
    }

    /// Sign in, then hydrate the catalog for writing to `collection`.
    pub async fn open_admin(
        config: &PortalConfig,
        credentials: &Credentials,
        collection: CollectionName,
    ) -> Result<Self, CommandError> {
        let portal = FirebasePortal::from_config(config).await?;
        portal
            .session()
            .sign_in(&credentials.email, &credentials.password)
            .await
            .map_err(PortalError::from)?;

        let diagnostics = portal.diagnostics();
        portal.initialize().await;

        let mut workspace = Self {
            portal,
            diagnostics,
        };
        for diagnostic in workspace.drain() {
            if diagnostic.collection() == collection {
                return Err(CommandError::HydrateFailed(diagnostic));
            }
            tracing::warn!(%diagnostic, "Catalog loaded with errors");
        }
        Ok(workspace)
    }

    /// Wait for queued writes and report any that failed.
    pub async fn commit(mut self) -> Result<(), CommandError> {
        self.portal.flush().await;
        match self
            .drain()
            .into_iter()
            .find(|d| matches!(d, Diagnostic::PersistFailed { .. }))
        {
            Some(diagnostic) => Err(CommandError::PersistFailed(diagnostic)),
            None => Ok(()),
        }
    }

    fn drain(&mut self) -> Vec<Diagnostic> {
        let mut drained = Vec::new();
        loop {
            match self.diagnostics.try_recv() {
                Ok(diagnostic) => drained.push(diagnostic),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed catalog diagnostics");
                }
                Err(_) => break,
            }
        }
        drained
    }
}
