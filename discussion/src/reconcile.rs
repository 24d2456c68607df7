use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    comment::tree::{self, Undo},
    error::{SyncError, TransportError},
    models::{Page, ThreadKey},
    notify::{Notifier, Operation},
    store::PageStore,
    transport::with_timeout,
};

/// Runs the mutate-now, confirm-or-revert lifecycle for one thread.
pub struct Reconciler {
    store: Arc<PageStore>,
    notifier: Notifier,
    request_timeout: Duration,
}

impl Reconciler {
    pub fn new(store: Arc<PageStore>, notifier: Notifier, request_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            request_timeout,
        }
    }

    /// Commits `optimistic` to the thread snapshot right away, then awaits
    /// `request`.
    ///
    /// On success `reconcile` gets the response and the snapshot as it is at
    /// that moment (which may hold later optimistic changes) and returns the
    /// pages with the server-owned fields folded in, or `None` when nothing
    /// needs to change. On failure the change is taken back: if nothing else
    /// touched the thread the snapshot captured before it is restored exactly,
    /// otherwise `undo` reverts only this change and keeps the others. The
    /// failure is then reported.
    ///
    /// If the thread was closed or restarted before `request` resolved, the
    /// outcome is dropped: nothing is written and nothing is reported. A
    /// dropped failure comes back as [`SyncError::StaleState`]; a dropped
    /// success still returns the response, since the server did apply it.
    ///
    /// The optimistic change is applied on the first poll, before the request
    /// is sent, so calls on the same thread apply their changes in the order
    /// they are first polled.
    pub async fn apply<T, O, Fut, C>(
        &self,
        operation: Operation,
        key: &ThreadKey,
        optimistic: O,
        undo: Undo,
        request: Fut,
        reconcile: C,
    ) -> Result<T, SyncError>
    where
        O: FnOnce(&[Page]) -> Vec<Page>,
        Fut: Future<Output = Result<T, TransportError>>,
        C: FnOnce(&T, &[Page]) -> Option<Vec<Page>>,
    {
        let generation = self.store.generation(key).ok_or_else(|| {
            tracing::debug!(%key, ?operation, "thread is not open, ignoring action");
            SyncError::StaleState
        })?;
        let (previous, produced) = self.store.update(&generation, optimistic)?;

        match with_timeout(self.request_timeout, request).await {
            Ok(response) => {
                let confirmed = self.store.update(&generation, |current| {
                    reconcile(&response, current).unwrap_or_else(|| current.to_vec())
                });
                match confirmed {
                    Ok(_) => self.notifier.success(operation),
                    Err(_) => {
                        tracing::debug!(%key, ?operation, "thread went inactive, dropping confirmation");
                    }
                }
                Ok(response)
            }
            Err(err) => {
                let err = SyncError::from(err);
                let reverted = self.store.revert(&generation, &produced, previous, |previous, current| {
                    tree::undo_in_pages(previous, current, &undo)
                });
                if reverted.is_err() {
                    tracing::debug!(%key, ?operation, %err, "thread went inactive, dropping rollback");
                    return Err(SyncError::StaleState);
                }
                tracing::warn!(%key, ?operation, %err, "request failed, rolled back optimistic update");
                self.notifier.failure(operation, &err);
                Err(err)
            }
        }
    }
}
