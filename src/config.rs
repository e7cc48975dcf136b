use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),
  #[error(
    "no configuration file found; create one at ~/.config/chat-sync/config.yaml"
  )]
  NoConfigFile,
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_yaml::Error,
  },
  #[error("api token not found; set the CHAT_SYNC_API_TOKEN environment variable")]
  NoApiToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub remote: RemoteConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Base URL of the chat service, e.g. "https://chat.example.com/api/"
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How many channels to keep in memory
  #[serde(default = "default_channel_capacity")]
  pub channel_capacity: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    CacheConfig {
      channel_capacity: default_channel_capacity(),
    }
  }
}

fn default_channel_capacity() -> usize {
  crate::chat::repository::ChannelRepository::DEFAULT_CACHE_CAPACITY
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
  /// Database path (default: the platform data dir under chat-sync/)
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./chat-sync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/chat-sync/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ConfigError::NotFound(p.to_path_buf()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(ConfigError::NoConfigFile),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("chat-sync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("chat-sync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Get the chat service API token from the environment.
  ///
  /// The token never lives in the config file.
  pub fn api_token() -> Result<String, ConfigError> {
    std::env::var("CHAT_SYNC_API_TOKEN").map_err(|_| ConfigError::NoApiToken)
  }
}
