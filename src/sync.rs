//! Sync backlog drain.
//!
//! Channels created or updated while offline sit in the durable store with a
//! pending or transiently-failed status. This module pushes that backlog to
//! the remote service and advances each channel's sync status based on the
//! outcome. Backoff and scheduling are deliberately not here: an external
//! scheduler calls [`SyncCoordinator::drain_once`] periodically or on
//! connectivity recovery.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chat::client::RemoteService;
use crate::chat::repository::ChannelRepository;
use crate::chat::types::{Channel, SyncStatus};
use crate::store::StoreError;

/// Drives the retry state machine over the stored sync backlog.
pub struct SyncCoordinator {
  repository: Arc<ChannelRepository>,
  remote: Arc<dyn RemoteService>,
}

impl SyncCoordinator {
  pub fn new(repository: Arc<ChannelRepository>, remote: Arc<dyn RemoteService>) -> Self {
    SyncCoordinator { repository, remote }
  }

  /// Drain the backlog once.
  ///
  /// Best-effort and restartable: if interrupted mid-batch, only channels
  /// already re-inserted have a changed status; the rest stay retry-eligible
  /// and are picked up by the next drain.
  pub async fn drain_once(&self) -> Result<Vec<Channel>, StoreError> {
    self
      .repository
      .retry_pending_sync(self.remote.as_ref())
      .await
  }
}

/// One pass over the backlog: load every channel awaiting sync and push each
/// to the remote service, sequentially.
///
/// Per channel:
/// - push succeeded: status becomes `Completed`, the channel is re-inserted
///   (persisted and cache-refreshed);
/// - push failed permanently: status becomes `FailedPermanently`, re-inserted,
///   never retried again;
/// - push failed transiently: nothing is persisted, the channel stays
///   retry-eligible for the next pass.
///
/// Whether a failure is permanent is the remote error's own verdict; no raw
/// status codes are interpreted here. Member lists ride along unchanged: the
/// drain reconciles sync status, not membership.
pub(crate) async fn retry_pending_sync(
  repository: &ChannelRepository,
  remote: &dyn RemoteService,
) -> Result<Vec<Channel>, StoreError> {
  let backlog = repository.select_sync_needed().await?;
  debug!(count = backlog.len(), "draining sync backlog");

  let mut processed = Vec::with_capacity(backlog.len());
  for mut channel in backlog {
    match remote.create_or_update(&channel).await {
      Ok(_) => {
        channel.sync_status = SyncStatus::Completed;
        repository.insert_one(channel.clone()).await?;
      }
      Err(err) if err.is_permanent() => {
        warn!(cid = %channel.cid(), error = %err, "channel sync failed permanently");
        channel.sync_status = SyncStatus::FailedPermanently;
        repository.insert_one(channel.clone()).await?;
      }
      Err(err) => {
        debug!(cid = %channel.cid(), error = %err, "channel sync failed, will retry");
      }
    }
    processed.push(channel);
  }

  if !processed.is_empty() {
    info!(count = processed.len(), "sync backlog drained");
  }
  Ok(processed)
}
