//! Offline-first synchronization core for a chat client.
//!
//! Keeps a bounded in-memory cache and a durable local store consistent with
//! a remote chat service, and reconciles locally-created channels that have
//! not yet reached it.
//!
//! - Reads go cache-first and fall back to the durable store, backfilling
//!   the cache ([`ChannelRepository::select`]).
//! - Writes land in the store before the cache ever sees them, so the cache
//!   never exposes unpersisted state ([`ChannelRepository::insert`]).
//! - Channels that have not reached the remote service are retried by
//!   [`SyncCoordinator::drain_once`], which an external scheduler invokes
//!   periodically or on connectivity recovery.

pub mod cache;
pub mod chat;
pub mod config;
pub mod store;
pub mod sync;

pub use cache::BoundedCache;
pub use chat::client::{HttpRemote, RemoteError, RemoteService};
pub use chat::repository::ChannelRepository;
pub use chat::types::{Channel, Member, SyncStatus, User, UserContext};
pub use config::{Config, ConfigError};
pub use store::{ChannelStore, MemoryStore, SqliteStore, StoreError};
pub use sync::SyncCoordinator;

use std::sync::Arc;
use thiserror::Error;

/// Errors from wiring the subsystem together.
#[derive(Debug, Error)]
pub enum SetupError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Remote(#[from] RemoteError),
}

/// The fully-wired subsystem: SQLite store, HTTP remote, repository, and
/// sync coordinator.
pub struct ChatSync {
  repository: Arc<ChannelRepository>,
  coordinator: SyncCoordinator,
}

impl ChatSync {
  /// Wire the subsystem from configuration for the given signed-in user.
  pub fn new(config: &Config, current_user: User) -> Result<Self, SetupError> {
    let store: Arc<dyn ChannelStore> = match &config.store.path {
      Some(path) => Arc::new(SqliteStore::open_at(path)?),
      None => Arc::new(SqliteStore::open()?),
    };
    let remote = Arc::new(HttpRemote::new(config, current_user)?);

    let repository = Arc::new(ChannelRepository::new(
      store,
      config.cache.channel_capacity,
    ));
    let coordinator = SyncCoordinator::new(Arc::clone(&repository), remote);

    Ok(ChatSync {
      repository,
      coordinator,
    })
  }

  pub fn repository(&self) -> &Arc<ChannelRepository> {
    &self.repository
  }

  pub fn coordinator(&self) -> &SyncCoordinator {
    &self.coordinator
  }
}
