//! Per-collection writer task.
//!
//! One task per collection drains a queue of full snapshots and writes them
//! in the order they were queued, one at a time. Failures are logged,
//! reported as diagnostics and otherwise dropped; the next snapshot
//! supersedes the failed one anyway.

use std::sync::Arc;

use support_portal_core::CatalogRecord;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, instrument, warn};

use super::Diagnostic;
use crate::store::{DocumentStore, encode_items};

/// Work queued for a collection's writer.
#[derive(Debug)]
pub(crate) enum WriteCommand<T> {
    /// Overwrite the remote document with this collection value.
    Persist { items: Arc<Vec<T>>, revision: u64 },
    /// Resolve once every earlier command has been handled.
    Flush(oneshot::Sender<()>),
}

/// Drain `commands` until every sender is gone.
#[instrument(skip_all, fields(collection = %T::COLLECTION))]
pub(crate) async fn run_writer<S, T>(
    store: Arc<S>,
    mut commands: mpsc::UnboundedReceiver<WriteCommand<T>>,
    diagnostics: broadcast::Sender<Diagnostic>,
) where
    S: DocumentStore,
    T: CatalogRecord,
{
    let collection = T::COLLECTION;

    while let Some(command) = commands.recv().await {
        match command {
            WriteCommand::Persist { items, revision } => {
                let result = match encode_items(collection, &items) {
                    Ok(document) => store.set(collection, document).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => debug!(revision, items = items.len(), "Collection persisted"),
                    Err(e) => {
                        warn!(revision, error = %e, "Failed to persist collection");
                        // No receivers just means nobody is showing notifications.
                        let _ = diagnostics.send(Diagnostic::PersistFailed {
                            collection,
                            message: e.to_string(),
                        });
                    }
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Writer stopped");
}
