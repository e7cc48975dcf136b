//! In-memory channel store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{ChannelStore, StoreError};
use crate::chat::types::Channel;

/// Store implementation backed by a plain map.
///
/// Used by tests and by embedders that do not want a database file. Provides
/// the same contract as [`super::SqliteStore`], minus durability across
/// process restarts.
#[derive(Default)]
pub struct MemoryStore {
  channels: Mutex<HashMap<String, Channel>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Channel>>, StoreError> {
    self.channels.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

#[async_trait]
impl ChannelStore for MemoryStore {
  async fn upsert_many(&self, channels: &[Channel]) -> Result<(), StoreError> {
    let mut map = self.lock()?;
    for channel in channels {
      map.insert(channel.cid(), channel.clone());
    }
    Ok(())
  }

  async fn select_by_cids(&self, cids: &[String]) -> Result<Vec<Channel>, StoreError> {
    let map = self.lock()?;
    Ok(cids.iter().filter_map(|cid| map.get(cid).cloned()).collect())
  }

  async fn select_sync_needed(&self) -> Result<Vec<Channel>, StoreError> {
    let map = self.lock()?;
    Ok(
      map
        .values()
        .filter(|c| c.sync_status.is_sync_needed())
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chat::types::SyncStatus;

  #[tokio::test]
  async fn behaves_like_a_key_addressable_map() {
    let store = MemoryStore::new();
    let mut a = Channel::new("messaging", "a");
    a.sync_status = SyncStatus::Pending;
    let mut b = Channel::new("messaging", "b");
    b.sync_status = SyncStatus::Completed;

    store.upsert_many(&[a.clone(), b.clone()]).await.unwrap();

    let found = store
      .select_by_cids(&["messaging:b".to_string(), "messaging:ghost".to_string()])
      .await
      .unwrap();
    assert_eq!(found, vec![b]);

    let needing = store.select_sync_needed().await.unwrap();
    assert_eq!(needing, vec![a]);
  }
}
