//! Remote chat service client.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use super::api_types::ApiChannel;
use super::types::{Channel, User, UserContext};
use crate::config::Config;

/// Errors surfaced by the remote service.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// Network-level failure: unreachable host, timeout, malformed response
  #[error("remote request failed: {0}")]
  Transport(#[from] reqwest::Error),
  /// The service answered with a non-success status
  #[error("remote service returned {status}: {message}")]
  Api { status: u16, message: String },
  #[error("invalid remote url: {0}")]
  Url(#[from] url::ParseError),
}

impl RemoteError {
  /// Whether retrying this request can ever succeed.
  ///
  /// Client errors are final, except request timeout (408) and rate limiting
  /// (429). Connection failures, timeouts, and server errors are all worth
  /// another pass.
  pub fn is_permanent(&self) -> bool {
    match self {
      RemoteError::Api { status, .. } => {
        (400..500).contains(status) && *status != 408 && *status != 429
      }
      RemoteError::Url(_) => true,
      RemoteError::Transport(_) => false,
    }
  }
}

/// Request/response surface of the remote chat service.
///
/// Creation is idempotent: every request carries a stable identity derived
/// from the entity key, so retrying an interrupted push must not duplicate
/// server-side state.
#[async_trait]
pub trait RemoteService: Send + Sync {
  /// Push a locally-created or locally-updated channel to the service and
  /// return the service's view of it.
  async fn create_or_update(&self, channel: &Channel) -> Result<Channel, RemoteError>;
}

/// HTTP client for the chat service API.
pub struct HttpRemote {
  http: reqwest::Client,
  base: Url,
  api_token: Option<String>,
  context: UserContext,
}

impl HttpRemote {
  pub fn new(config: &Config, current_user: User) -> Result<Self, RemoteError> {
    let base = Url::parse(&config.remote.base_url)?;

    Ok(HttpRemote {
      http: reqwest::Client::new(),
      base,
      api_token: Config::api_token().ok(),
      context: UserContext::new(current_user),
    })
  }
}

/// Stable fixed-length request identity for idempotent creation.
fn request_identity(cid: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(cid.as_bytes());
  hex::encode(hasher.finalize())
}

#[async_trait]
impl RemoteService for HttpRemote {
  async fn create_or_update(&self, channel: &Channel) -> Result<Channel, RemoteError> {
    let url = self
      .base
      .join(&format!("channels/{}/{}", channel.channel_type, channel.id))?;

    let mut request = self
      .http
      .post(url)
      .header("Idempotency-Key", request_identity(&channel.cid()))
      .json(&ApiChannel::from(channel));
    if let Some(token) = &self.api_token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(RemoteError::Api {
        status: status.as_u16(),
        message,
      });
    }

    let api: ApiChannel = response.json().await?;
    Ok(api.into_domain(&self.context))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn api_error(status: u16) -> RemoteError {
    RemoteError::Api {
      status,
      message: String::new(),
    }
  }

  #[test]
  fn client_errors_are_permanent() {
    assert!(api_error(400).is_permanent());
    assert!(api_error(404).is_permanent());
    assert!(api_error(422).is_permanent());
  }

  #[test]
  fn timeouts_rate_limits_and_server_errors_are_transient() {
    assert!(!api_error(408).is_permanent());
    assert!(!api_error(429).is_permanent());
    assert!(!api_error(500).is_permanent());
    assert!(!api_error(503).is_permanent());
  }

  #[test]
  fn request_identity_is_stable_and_fixed_length() {
    let a = request_identity("messaging:general");
    let b = request_identity("messaging:general");
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert_ne!(a, request_identity("messaging:random"));
  }
}
