use std::{sync::Arc, time::Duration};

use crate::{
    directory::EntityDirectory,
    error::SyncError,
    models::{EntityId, MergeDirection, MergeRecord},
    notify::{Notifier, Operation},
    store::PageStore,
    transport::{Transport, with_timeout},
};

/// Moves one entity's discussion into another and hides the merged entity.
///
/// Comment trees are never spliced locally: the two sides are paginated
/// independently, so the surviving thread is refetched instead.
pub struct MergeEngine {
    transport: Arc<dyn Transport>,
    store: Arc<PageStore>,
    directory: Arc<EntityDirectory>,
    notifier: Notifier,
    request_timeout: Duration,
}

impl MergeEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<PageStore>,
        directory: Arc<EntityDirectory>,
        notifier: Notifier,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            directory,
            notifier,
            request_timeout,
        }
    }

    /// Merges `source` into `target`, or `target` into `source` for
    /// [`MergeDirection::Reverse`].
    ///
    /// Callers must not run two merges touching the same entity at once.
    pub async fn merge(
        &self,
        source: &EntityId,
        target: &EntityId,
        direction: MergeDirection,
    ) -> Result<MergeRecord, SyncError> {
        if source == target {
            return Err("A post cannot be merged into itself".into());
        }

        let (merged_id, surviving_id) = MergeRecord::roles(source, target, direction);

        if let Some(merged_to) = self.directory.merged_to(&merged_id) {
            tracing::debug!(%merged_id, %merged_to, "entity already merged, ignoring request");
            return Err(SyncError::StaleState);
        }

        let hidden = self.directory.remove_from_listings(&merged_id);

        let response = with_timeout(
            self.request_timeout,
            self.transport.post_merge(&merged_id, &surviving_id),
        )
        .await;

        if let Err(err) = response {
            let err = SyncError::from(err);
            self.directory.restore_listings(&merged_id, hidden);
            tracing::warn!(%merged_id, %surviving_id, %err, "merge failed, restored listings");
            self.notifier.failure(Operation::Merge, &err);
            return Err(err);
        }

        self.directory.mark_merged(&merged_id, &surviving_id);
        let discarded = self.store.discard_entity(&merged_id);
        let invalidated = self.store.invalidate_entity(&surviving_id);

        tracing::info!(
            %merged_id,
            %surviving_id,
            listings = hidden.len(),
            discarded,
            invalidated,
            "merged discussion"
        );
        self.notifier.success(Operation::Merge);

        Ok(MergeRecord {
            merged_id,
            surviving_id,
            merged_at: chrono::Utc::now().naive_utc(),
        })
    }
}
