//! One synchronised collection.

use std::sync::{Arc, OnceLock};

use support_portal_core::{CatalogError, CatalogRecord, IdGenerator};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use super::writer::{WriteCommand, run_writer};
use super::{Diagnostic, SyncError, SyncPhase};
use crate::store::{DocumentStore, decode_items};

/// In-memory owner of one collection and its write-through to the store.
///
/// The write gate is the writer queue itself: it only exists once the first
/// hydrate has finished, and every mutation before that is rejected.
pub struct CollectionSync<T: CatalogRecord> {
    items: watch::Sender<Arc<Vec<T>>>,
    revision: watch::Sender<u64>,
    phase: watch::Sender<SyncPhase>,
    writer: OnceLock<mpsc::UnboundedSender<WriteCommand<T>>>,
    diagnostics: broadcast::Sender<Diagnostic>,
}

impl<T: CatalogRecord> std::fmt::Debug for CollectionSync<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSync")
            .field("collection", &T::COLLECTION)
            .field("phase", &*self.phase.borrow())
            .field("revision", &*self.revision.borrow())
            .field("items", &self.items.borrow().len())
            .finish()
    }
}

impl<T: CatalogRecord> CollectionSync<T> {
    pub(crate) fn new(diagnostics: broadcast::Sender<Diagnostic>) -> Self {
        Self {
            items: watch::channel(Arc::new(Vec::new())).0,
            revision: watch::channel(0).0,
            phase: watch::channel(SyncPhase::Uninitialized).0,
            writer: OnceLock::new(),
            diagnostics,
        }
    }

    /// Read the collection from the store once and open the write gate.
    ///
    /// An absent document hydrates to an empty collection. A failed read
    /// does too, and additionally publishes [`Diagnostic::HydrateFailed`].
    ///
    /// Only one caller reads; concurrent callers wait until the gate is open.
    /// If the reading call is dropped before it finishes, the collection goes
    /// back to [`SyncPhase::Uninitialized`] and a waiting caller takes over.
    #[instrument(skip_all, fields(collection = %T::COLLECTION))]
    pub async fn hydrate<S: DocumentStore>(&self, store: Arc<S>) {
        loop {
            let started = self.phase.send_if_modified(|phase| {
                if *phase == SyncPhase::Uninitialized {
                    *phase = SyncPhase::Hydrating;
                    true
                } else {
                    false
                }
            });
            if started {
                break;
            }

            let mut phase = self.phase.subscribe();
            let Ok(seen) = phase
                .wait_for(|phase| *phase != SyncPhase::Hydrating)
                .await
                .map(|phase| *phase)
            else {
                return;
            };
            if seen == SyncPhase::Ready {
                debug!("Already hydrated");
                return;
            }
        }

        let rollback = HydrateRollback {
            phase: &self.phase,
            armed: true,
        };

        let loaded = store
            .get(T::COLLECTION)
            .await
            .and_then(|document| match document {
                Some(document) => decode_items::<T>(T::COLLECTION, &document),
                None => {
                    debug!("No stored document, starting empty");
                    Ok(Vec::new())
                }
            });

        let items = match loaded {
            Ok(items) => {
                info!(items = items.len(), "Collection hydrated");
                items
            }
            Err(e) => {
                warn!(error = %e, "Failed to hydrate collection, starting empty");
                let _ = self.diagnostics.send(Diagnostic::HydrateFailed {
                    collection: T::COLLECTION,
                    message: e.to_string(),
                });
                Vec::new()
            }
        };

        self.items.send_replace(Arc::new(items));
        self.revision.send_modify(|revision| *revision += 1);

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_writer::<S, T>(store, receiver, self.diagnostics.clone()));
        // Only the caller that moved the phase out of Uninitialized gets here.
        let _ = self.writer.set(sender);

        rollback.disarm();
        self.phase.send_replace(SyncPhase::Ready);
    }

    /// Apply a mutation and queue the resulting collection for persistence.
    ///
    /// Runs to completion before returning; the write itself happens in the
    /// background, after every write queued before it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotReady`] before hydration has finished and
    /// [`SyncError::Rejected`] when the mutator rejects the intent. Neither
    /// changes the collection or reaches the store.
    pub fn apply(&self, intent: T::Intent, ids: &IdGenerator) -> Result<Arc<Vec<T>>, SyncError> {
        self.commit(|current| Ok((T::apply(current, intent, ids)?, ())))
            .map(|(items, ())| items)
    }

    /// Replace the whole collection and queue it for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotReady`] before hydration has finished.
    pub fn replace(&self, items: Vec<T>) -> Result<Arc<Vec<T>>, SyncError> {
        self.commit(|_| Ok((items, ()))).map(|(items, ())| items)
    }

    /// Like [`CollectionSync::apply`], for a mutator that also reports on
    /// what it did. The report comes from the same step that produced the
    /// published value.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotReady`] before hydration has finished, or the
    /// mutator's rejection.
    pub fn apply_with<R, F>(&self, mutator: F) -> Result<(Arc<Vec<T>>, R), SyncError>
    where
        F: FnOnce(&[T]) -> Result<(Vec<T>, R), CatalogError>,
    {
        self.commit(|current| mutator(current).map_err(SyncError::from))
    }

    fn commit<R, F>(&self, next: F) -> Result<(Arc<Vec<T>>, R), SyncError>
    where
        F: FnOnce(&[T]) -> Result<(Vec<T>, R), SyncError>,
    {
        let writer = self
            .writer
            .get()
            .filter(|_| self.phase() == SyncPhase::Ready)
            .ok_or(SyncError::NotReady(T::COLLECTION))?;

        let mut outcome = Err(SyncError::NotReady(T::COLLECTION));
        // The new value and its write are published under the same lock so
        // queue order always matches mutation order.
        self.items.send_if_modified(|items| match next(items.as_slice()) {
            Ok((updated, report)) => {
                let updated = Arc::new(updated);
                let revision = *self.revision.borrow() + 1;
                self.revision.send_replace(revision);
                if writer
                    .send(WriteCommand::Persist {
                        items: Arc::clone(&updated),
                        revision,
                    })
                    .is_err()
                {
                    warn!(collection = %T::COLLECTION, revision, "Writer has stopped, change not persisted");
                }
                *items = Arc::clone(&updated);
                outcome = Ok((updated, report));
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    /// Current collection value.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items.borrow())
    }

    /// Receive every new collection value.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.items.subscribe()
    }

    /// Change counter: bumped by hydration and by every accepted mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    #[must_use]
    pub fn watch_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Wait until every write queued so far has been issued and answered.
    ///
    /// Returns immediately if the collection was never hydrated.
    pub async fn flush(&self) {
        let Some(writer) = self.writer.get() else {
            return;
        };
        let (done, finished) = oneshot::channel();
        if writer.send(WriteCommand::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }
}

/// Puts a hydrate that never finished back to `Uninitialized`.
struct HydrateRollback<'a> {
    phase: &'a watch::Sender<SyncPhase>,
    armed: bool,
}

impl HydrateRollback<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for HydrateRollback<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Hydrate cancelled before the read finished");
            self.phase.send_replace(SyncPhase::Uninitialized);
        }
    }
}
