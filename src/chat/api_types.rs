//! Serde types matching the chat service's wire format.
//!
//! These types are separate from domain types to allow clean (de)serialization
//! while keeping domain types focused on application needs. Wire records are
//! flat, nullable-heavy, and use server field names; they never outlive a
//! single mapping call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{Channel, Member, SyncStatus, User, UserContext};

// ============================================================================
// Wire record types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  // Catch-all for forward-compatible fields
  #[serde(flatten)]
  pub extra_data: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMember {
  pub user_id: String,
  /// Full user object; the server may omit it and send only `user_id`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<ApiUser>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiChannel {
  #[serde(rename = "type")]
  pub channel_type: String,
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_by_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_by: Option<ApiUser>,
  #[serde(default)]
  pub frozen: bool,
  #[serde(default)]
  pub member_count: u32,
  /// Members in server order
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub members: Vec<ApiMember>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_message_at: Option<DateTime<Utc>>,
  // Catch-all for forward-compatible fields
  #[serde(flatten)]
  pub extra_data: HashMap<String, serde_json::Value>,
}

// ============================================================================
// Domain -> wire
// ============================================================================

impl From<&User> for ApiUser {
  fn from(user: &User) -> Self {
    ApiUser {
      id: user.id.clone(),
      name: if user.name.is_empty() {
        None
      } else {
        Some(user.name.clone())
      },
      image: user.image.clone(),
      extra_data: user.extra_data.clone(),
    }
  }
}

impl From<&Member> for ApiMember {
  fn from(member: &Member) -> Self {
    ApiMember {
      user_id: member.user.id.clone(),
      user: Some(ApiUser::from(&member.user)),
      role: member.role.clone(),
    }
  }
}

impl From<&Channel> for ApiChannel {
  fn from(channel: &Channel) -> Self {
    ApiChannel {
      channel_type: channel.channel_type.clone(),
      id: channel.id.clone(),
      name: if channel.name.is_empty() {
        None
      } else {
        Some(channel.name.clone())
      },
      created_by_id: channel.created_by.as_ref().map(|u| u.id.clone()),
      created_by: channel.created_by.as_ref().map(ApiUser::from),
      frozen: channel.frozen,
      member_count: channel.member_count,
      members: channel.members.iter().map(ApiMember::from).collect(),
      created_at: channel.created_at,
      updated_at: channel.updated_at,
      last_message_at: channel.last_message_at,
      extra_data: channel.extra_data.clone(),
    }
  }
}

// ============================================================================
// Wire -> domain
// ============================================================================

impl ApiUser {
  pub fn into_domain(self) -> User {
    User {
      id: self.id,
      name: self.name.unwrap_or_default(),
      image: self.image,
      extra_data: self.extra_data,
    }
  }
}

impl ApiMember {
  pub fn into_domain(self, context: &UserContext) -> Member {
    let user = match self.user {
      Some(user) => user.into_domain(),
      None => context.resolve(&self.user_id),
    };
    Member {
      user,
      role: self.role,
    }
  }
}

impl ApiChannel {
  /// Map a wire record into the domain model.
  ///
  /// Fields the server omitted decode to their zero value. Bare user id
  /// references are filled from `context`.
  pub fn into_domain(self, context: &UserContext) -> Channel {
    let created_by = match (self.created_by, self.created_by_id) {
      (Some(user), _) => Some(user.into_domain()),
      (None, Some(id)) => Some(context.resolve(&id)),
      (None, None) => None,
    };
    Channel {
      channel_type: self.channel_type,
      id: self.id,
      name: self.name.unwrap_or_default(),
      created_by,
      frozen: self.frozen,
      member_count: self.member_count,
      members: self
        .members
        .into_iter()
        .map(|m| m.into_domain(context))
        .collect(),
      created_at: self.created_at,
      updated_at: self.updated_at,
      last_message_at: self.last_message_at,
      sync_status: SyncStatus::default(),
      extra_data: self.extra_data,
    }
  }
}
