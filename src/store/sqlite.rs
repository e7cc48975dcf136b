//! SQLite-backed channel store.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{ChannelStore, StoreError};
use crate::chat::types::{Channel, SyncStatus};

/// Schema for the channel table.
///
/// The channel itself is stored as a JSON blob; `sync_status` is duplicated
/// into its own indexed column so the sync backlog can be selected without
/// deserializing every row.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS channels (
    cid TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    sync_status INTEGER NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_channels_sync_status
    ON channels(sync_status);
"#;

/// Durable store over a local SQLite database.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the database at the default location.
  pub fn open() -> Result<Self, StoreError> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self, StoreError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Open a private in-memory database. Used by tests.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    let store = Self {
      conn: Mutex::new(Connection::open_in_memory()?),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StoreError::NoDataDir)?;

    Ok(data_dir.join("chat-sync").join("chat.db"))
  }

  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

#[async_trait]
impl ChannelStore for SqliteStore {
  async fn upsert_many(&self, channels: &[Channel]) -> Result<(), StoreError> {
    if channels.is_empty() {
      return Ok(());
    }

    let conn = self.lock()?;
    conn.execute("BEGIN TRANSACTION", [])?;

    let write_all = || -> Result<(), StoreError> {
      for channel in channels {
        let data = serde_json::to_vec(channel)?;
        conn.execute(
          "INSERT OR REPLACE INTO channels (cid, data, sync_status, updated_at)
           VALUES (?, ?, ?, ?)",
          params![
            channel.cid(),
            data,
            channel.sync_status.code(),
            channel.updated_at.map(|t| t.to_rfc3339()),
          ],
        )?;
      }
      Ok(())
    };

    match write_all() {
      Ok(()) => {
        conn.execute("COMMIT", [])?;
        Ok(())
      }
      Err(e) => {
        let _ = conn.execute("ROLLBACK", []);
        Err(e)
      }
    }
  }

  async fn select_by_cids(&self, cids: &[String]) -> Result<Vec<Channel>, StoreError> {
    if cids.is_empty() {
      return Ok(Vec::new());
    }

    let conn = self.lock()?;
    let placeholders = vec!["?"; cids.len()].join(", ");
    let sql = format!("SELECT data FROM channels WHERE cid IN ({placeholders})");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params_from_iter(cids.iter()), |row| {
      row.get::<_, Vec<u8>>(0)
    })?;

    let mut channels = Vec::with_capacity(cids.len());
    for row in rows {
      let data = row?;
      channels.push(serde_json::from_slice(&data)?);
    }

    Ok(channels)
  }

  async fn select_sync_needed(&self) -> Result<Vec<Channel>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(
      "SELECT data FROM channels WHERE sync_status IN (?, ?)",
    )?;

    let rows = stmt.query_map(
      params![
        SyncStatus::Pending.code(),
        SyncStatus::FailedTransient.code(),
      ],
      |row| row.get::<_, Vec<u8>>(0),
    )?;

    let mut channels = Vec::new();
    for row in rows {
      let data = row?;
      channels.push(serde_json::from_slice(&data)?);
    }

    Ok(channels)
  }
}
