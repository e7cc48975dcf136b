//! Durable persistence for syncable entities.
//!
//! The store is the source of truth: the in-memory cache is only an
//! acceleration of it. Implementations must provide at-least bulk-upsert
//! atomicity for the set of rows written in one call.

use async_trait::async_trait;
use thiserror::Error;

use crate::chat::types::Channel;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors surfaced by a channel store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),
  #[error("stored channel could not be (de)serialized: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("failed to prepare store directory: {0}")]
  Io(#[from] std::io::Error),
  #[error("could not determine data directory")]
  NoDataDir,
  #[error("store lock poisoned")]
  LockPoisoned,
}

/// Key-addressable persistent map of channels.
#[async_trait]
pub trait ChannelStore: Send + Sync {
  /// Insert or replace every given channel in one atomic bulk write.
  async fn upsert_many(&self, channels: &[Channel]) -> Result<(), StoreError>;

  /// Look up channels by cid. Missing keys are silently omitted from the
  /// result.
  async fn select_by_cids(&self, cids: &[String]) -> Result<Vec<Channel>, StoreError>;

  /// All channels still awaiting synchronization (status pending or
  /// transiently failed).
  async fn select_sync_needed(&self) -> Result<Vec<Channel>, StoreError>;
}
