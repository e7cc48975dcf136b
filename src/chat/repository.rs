//! Read-through/write-through channel repository.

use std::sync::Arc;
use tracing::debug;

use crate::cache::BoundedCache;
use crate::chat::client::RemoteService;
use crate::chat::types::Channel;
use crate::store::{ChannelStore, StoreError};

/// Orchestrates the bounded cache and the durable store.
///
/// Reads go through the cache and fall back to the store; writes land in the
/// store first and only then in the cache, so the cache never exposes state
/// the store has not accepted. All channel mutation flows through here.
pub struct ChannelRepository {
  store: Arc<dyn ChannelStore>,
  cache: BoundedCache<Channel>,
}

impl ChannelRepository {
  /// Default number of channels kept in memory.
  pub const DEFAULT_CACHE_CAPACITY: usize = 100;

  pub fn new(store: Arc<dyn ChannelStore>, cache_capacity: usize) -> Self {
    ChannelRepository {
      store,
      cache: BoundedCache::new(cache_capacity),
    }
  }

  /// Persist channels, then refresh the cache (write-through).
  ///
  /// Empty input is a no-op: no store write, no cache mutation.
  pub async fn insert(&self, channels: &[Channel]) -> Result<(), StoreError> {
    if channels.is_empty() {
      return Ok(());
    }

    self.store.upsert_many(channels).await?;
    // The durable write succeeded; only now may the cache observe it
    for channel in channels {
      self.cache.put(channel.cid(), channel.clone());
    }

    Ok(())
  }

  pub async fn insert_one(&self, channel: Channel) -> Result<(), StoreError> {
    self.insert(std::slice::from_ref(&channel)).await
  }

  /// Load channels by cid, reading through the cache.
  ///
  /// Cache misses are fetched from the store in a single bulk lookup and
  /// backfilled. Unknown cids are simply absent from the result. The result
  /// order is unrelated to the input order.
  pub async fn select(&self, cids: &[String]) -> Result<Vec<Channel>, StoreError> {
    let mut cached = Vec::new();
    let mut missing = Vec::new();
    for cid in cids {
      match self.cache.get(cid) {
        Some(channel) => cached.push(channel),
        None => missing.push(cid.clone()),
      }
    }

    let mut channels = if missing.is_empty() {
      Vec::new()
    } else {
      debug!(misses = missing.len(), "loading channels from store");
      let loaded = self.store.select_by_cids(&missing).await?;
      for channel in &loaded {
        self.cache.put(channel.cid(), channel.clone());
      }
      loaded
    };

    channels.extend(cached);
    Ok(channels)
  }

  /// Load a single channel by cid.
  pub async fn select_one(&self, cid: &str) -> Result<Option<Channel>, StoreError> {
    let mut channels = self.select(std::slice::from_ref(&cid.to_string())).await?;
    Ok(channels.pop())
  }

  /// All channels awaiting synchronization, straight from the store.
  ///
  /// Full scans are not cache-worthy; this bypasses the cache entirely.
  pub async fn select_sync_needed(&self) -> Result<Vec<Channel>, StoreError> {
    self.store.select_sync_needed().await
  }

  /// Push every channel awaiting synchronization to the remote service,
  /// once. See [`crate::sync`] for the per-channel state machine.
  pub async fn retry_pending_sync(
    &self,
    remote: &dyn RemoteService,
  ) -> Result<Vec<Channel>, StoreError> {
    crate::sync::retry_pending_sync(self, remote).await
  }

  #[cfg(test)]
  fn cached(&self, cid: &str) -> bool {
    self.cache.contains(cid)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chat::types::SyncStatus;
  use crate::store::MemoryStore;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Store wrapper that counts calls, for asserting cache behavior.
  struct RecordingStore {
    inner: MemoryStore,
    upserts: AtomicUsize,
    selects: AtomicUsize,
  }

  impl RecordingStore {
    fn new() -> Self {
      RecordingStore {
        inner: MemoryStore::new(),
        upserts: AtomicUsize::new(0),
        selects: AtomicUsize::new(0),
      }
    }
  }

  #[async_trait]
  impl ChannelStore for RecordingStore {
    async fn upsert_many(&self, channels: &[Channel]) -> Result<(), StoreError> {
      self.upserts.fetch_add(1, Ordering::SeqCst);
      self.inner.upsert_many(channels).await
    }

    async fn select_by_cids(&self, cids: &[String]) -> Result<Vec<Channel>, StoreError> {
      self.selects.fetch_add(1, Ordering::SeqCst);
      self.inner.select_by_cids(cids).await
    }

    async fn select_sync_needed(&self) -> Result<Vec<Channel>, StoreError> {
      self.inner.select_sync_needed().await
    }
  }

  fn channel(id: &str) -> Channel {
    let mut channel = Channel::new("messaging", id);
    channel.name = format!("Channel {id}");
    channel
  }

  #[tokio::test]
  async fn insert_then_select_round_trips() {
    let store = Arc::new(RecordingStore::new());
    let repository = ChannelRepository::new(store, 10);

    let a = channel("a");
    repository.insert(std::slice::from_ref(&a)).await.unwrap();

    let found = repository
      .select(&["messaging:a".to_string()])
      .await
      .unwrap();
    assert_eq!(found, vec![a]);
  }

  #[tokio::test]
  async fn empty_insert_touches_neither_store_nor_cache() {
    let store = Arc::new(RecordingStore::new());
    let repository = ChannelRepository::new(Arc::clone(&store) as Arc<dyn ChannelStore>, 10);

    repository.insert(&[]).await.unwrap();

    assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
    assert!(!repository.cached("messaging:a"));
  }

  #[tokio::test]
  async fn cache_hits_avoid_the_store() {
    let store = Arc::new(RecordingStore::new());
    let repository = ChannelRepository::new(Arc::clone(&store) as Arc<dyn ChannelStore>, 10);

    repository.insert(&[channel("a")]).await.unwrap();
    repository
      .select(&["messaging:a".to_string()])
      .await
      .unwrap();

    assert_eq!(store.selects.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn misses_are_loaded_in_one_bulk_lookup_and_backfilled() {
    let store = Arc::new(RecordingStore::new());
    // Populate the store behind the repository's back (cold cache)
    store
      .upsert_many(&[channel("a"), channel("b"), channel("c")])
      .await
      .unwrap();

    let repository = ChannelRepository::new(Arc::clone(&store) as Arc<dyn ChannelStore>, 10);
    let cids: Vec<String> = ["messaging:a", "messaging:b", "messaging:c", "messaging:ghost"]
      .iter()
      .map(|s| s.to_string())
      .collect();

    let found = repository.select(&cids).await.unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(store.selects.load(Ordering::SeqCst), 1);

    // Backfilled: the same lookup is now served from the cache
    let again = repository.select(&cids[..3]).await.unwrap();
    assert_eq!(again.len(), 3);
    assert_eq!(store.selects.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn mixed_hits_and_misses_return_the_union() {
    let store = Arc::new(RecordingStore::new());
    store.upsert_many(&[channel("cold")]).await.unwrap();

    let repository = ChannelRepository::new(Arc::clone(&store) as Arc<dyn ChannelStore>, 10);
    repository.insert(&[channel("hot")]).await.unwrap();

    let mut cids: Vec<String> = repository
      .select(&["messaging:hot".to_string(), "messaging:cold".to_string()])
      .await
      .unwrap()
      .iter()
      .map(Channel::cid)
      .collect();
    cids.sort();

    assert_eq!(cids, vec!["messaging:cold", "messaging:hot"]);
  }

  #[tokio::test]
  async fn evicted_channels_fall_back_to_the_store() {
    let store = Arc::new(RecordingStore::new());
    let repository = ChannelRepository::new(
      Arc::clone(&store) as Arc<dyn ChannelStore>,
      ChannelRepository::DEFAULT_CACHE_CAPACITY,
    );

    // Insert 101 distinct channels into a cache of capacity 100
    for i in 1..=101 {
      repository.insert(&[channel(&format!("e{i}"))]).await.unwrap();
    }

    // The least recently used entry was evicted, the newest was not
    assert!(!repository.cached("messaging:e1"));
    assert!(repository.cached("messaging:e101"));

    // A select for the evicted channel still succeeds via store fallback
    let selects_before = store.selects.load(Ordering::SeqCst);
    let found = repository.select_one("messaging:e1").await.unwrap();
    assert_eq!(found.map(|c| c.cid()), Some("messaging:e1".to_string()));
    assert_eq!(store.selects.load(Ordering::SeqCst), selects_before + 1);

    // The newest channel is still a pure cache hit
    let found = repository.select_one("messaging:e101").await.unwrap();
    assert!(found.is_some());
    assert_eq!(store.selects.load(Ordering::SeqCst), selects_before + 1);
  }

  #[tokio::test]
  async fn select_sync_needed_bypasses_the_cache() {
    let store = Arc::new(RecordingStore::new());
    let repository = ChannelRepository::new(Arc::clone(&store) as Arc<dyn ChannelStore>, 10);

    let mut pending = channel("pending");
    pending.sync_status = SyncStatus::Pending;
    let mut done = channel("done");
    done.sync_status = SyncStatus::Completed;

    repository.insert(&[pending.clone(), done]).await.unwrap();

    let needing = repository.select_sync_needed().await.unwrap();
    assert_eq!(needing, vec![pending]);
  }
}
