//! Domain model for syncable chat entities.
//!
//! These types are what the rest of the crate operates on. Their wire-format
//! counterparts live in `api_types` and never leak past the remote boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Synchronization lifecycle of a locally-stored entity.
///
/// Only `Pending` and `FailedTransient` entities are eligible for retry.
/// `FailedPermanently` entities are kept for audit but never retried;
/// `Completed` entities are excluded from the sync backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
  /// Created locally, not yet pushed to the remote service
  Pending,
  /// A push is currently in flight
  InProgress,
  /// The remote service has acknowledged this entity
  Completed,
  /// The last push failed in a way that is safe to retry
  FailedTransient,
  /// The remote service rejected this entity; retrying will not help
  FailedPermanently,
}

impl SyncStatus {
  /// Integer code stored in the queryable sync_status column.
  pub fn code(self) -> i64 {
    match self {
      SyncStatus::Pending => 0,
      SyncStatus::InProgress => 1,
      SyncStatus::Completed => 2,
      SyncStatus::FailedTransient => 3,
      SyncStatus::FailedPermanently => 4,
    }
  }

  /// Inverse of [`SyncStatus::code`].
  pub fn from_code(code: i64) -> Option<Self> {
    match code {
      0 => Some(SyncStatus::Pending),
      1 => Some(SyncStatus::InProgress),
      2 => Some(SyncStatus::Completed),
      3 => Some(SyncStatus::FailedTransient),
      4 => Some(SyncStatus::FailedPermanently),
      _ => None,
    }
  }

  /// Whether this entity still needs to reach the remote service.
  pub fn is_sync_needed(self) -> bool {
    matches!(self, SyncStatus::Pending | SyncStatus::FailedTransient)
  }
}

impl Default for SyncStatus {
  /// An entity received from the remote service has nothing left to sync.
  fn default() -> Self {
    SyncStatus::Completed
  }
}

/// A chat user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub name: String,
  pub image: Option<String>,
  /// Forward-compatible fields the server may attach to a user
  pub extra_data: HashMap<String, serde_json::Value>,
}

impl User {
  pub fn new(id: impl Into<String>) -> Self {
    User {
      id: id.into(),
      ..Default::default()
    }
  }
}

/// A user's membership in a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
  pub user: User,
  pub role: Option<String>,
}

/// A chat channel, the unit of synchronization.
///
/// Channels are mutated only through the repository so that the cache and
/// the durable store never diverge after a successful write. They are never
/// physically deleted by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
  pub channel_type: String,
  pub id: String,
  pub name: String,
  pub created_by: Option<User>,
  pub frozen: bool,
  pub member_count: u32,
  /// Members in server order
  pub members: Vec<Member>,
  pub created_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
  pub last_message_at: Option<DateTime<Utc>>,
  pub sync_status: SyncStatus,
  /// Forward-compatible fields; round-trips unchanged through the wire
  pub extra_data: HashMap<String, serde_json::Value>,
}

impl Channel {
  /// A channel first observed locally, awaiting its first push.
  pub fn new(channel_type: impl Into<String>, id: impl Into<String>) -> Self {
    Channel {
      channel_type: channel_type.into(),
      id: id.into(),
      name: String::new(),
      created_by: None,
      frozen: false,
      member_count: 0,
      members: Vec::new(),
      created_at: None,
      updated_at: None,
      last_message_at: None,
      sync_status: SyncStatus::Pending,
      extra_data: HashMap::new(),
    }
  }

  /// Composite key, e.g. "messaging:general"
  pub fn cid(&self) -> String {
    format!("{}:{}", self.channel_type, self.id)
  }
}

/// Resolved user identities available while decoding wire records.
///
/// Lets the mapper turn a bare user id into a full [`User`] without a round
/// trip. Always seeded with the current user.
#[derive(Debug, Clone)]
pub struct UserContext {
  users: HashMap<String, User>,
}

impl UserContext {
  pub fn new(current_user: User) -> Self {
    let mut users = HashMap::new();
    users.insert(current_user.id.clone(), current_user);
    UserContext { users }
  }

  /// Make another known user available for reference resolution.
  pub fn insert(&mut self, user: User) {
    self.users.insert(user.id.clone(), user);
  }

  /// Resolve a user id to a full user.
  ///
  /// Unknown ids resolve to a stub carrying only the id, so decoding stays
  /// total.
  pub fn resolve(&self, id: &str) -> User {
    self
      .users
      .get(id)
      .cloned()
      .unwrap_or_else(|| User::new(id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sync_status_codes_round_trip() {
    for status in [
      SyncStatus::Pending,
      SyncStatus::InProgress,
      SyncStatus::Completed,
      SyncStatus::FailedTransient,
      SyncStatus::FailedPermanently,
    ] {
      assert_eq!(SyncStatus::from_code(status.code()), Some(status));
    }
    assert_eq!(SyncStatus::from_code(99), None);
  }

  #[test]
  fn only_pending_and_transient_need_sync() {
    assert!(SyncStatus::Pending.is_sync_needed());
    assert!(SyncStatus::FailedTransient.is_sync_needed());
    assert!(!SyncStatus::InProgress.is_sync_needed());
    assert!(!SyncStatus::Completed.is_sync_needed());
    assert!(!SyncStatus::FailedPermanently.is_sync_needed());
  }

  #[test]
  fn cid_is_type_and_id() {
    let channel = Channel::new("messaging", "general");
    assert_eq!(channel.cid(), "messaging:general");
  }

  #[test]
  fn user_context_resolves_known_and_unknown_ids() {
    let mut me = User::new("me");
    me.name = "Me".to_string();
    let ctx = UserContext::new(me.clone());

    assert_eq!(ctx.resolve("me"), me);

    let stranger = ctx.resolve("someone-else");
    assert_eq!(stranger.id, "someone-else");
    assert!(stranger.name.is_empty());
  }
}
