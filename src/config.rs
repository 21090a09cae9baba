//! Configuration loader and validator for the notifications server.
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub store: Store,
    #[serde(default)]
    pub auth: Auth,
}

/// Server and page settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub listen_addr: String,
    /// Prefix the page's script uses for its POST targets.
    #[serde(default)]
    pub base_uri: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Raw HTML appended to `<head>`.
    #[serde(default)]
    pub head_pre: String,
    /// Raw HTML opened at the top of `<body>`.
    #[serde(default)]
    pub body_pre: String,
}

fn default_title() -> String {
    "Notifications".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Remote,
}

/// Where notifications come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub kind: StoreKind,
    /// JSON fixtures seeding the memory store.
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auth {
    #[serde(default)]
    pub users: Vec<AuthUser>,
}

/// A viewer recognised by its access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub token: String,
    pub id: u64,
    #[serde(default)]
    pub domain: String,
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.app
            .listen_addr
            .parse()
            .map_err(|_| ConfigError::Invalid("app.listen_addr must be a socket address"))
    }

    pub fn remote_url(&self) -> Result<reqwest::Url, ConfigError> {
        let raw = self
            .store
            .remote_url
            .as_deref()
            .ok_or(ConfigError::Invalid("store.remote_url is required for remote store"))?;
        reqwest::Url::parse(raw)
            .map_err(|_| ConfigError::Invalid("store.remote_url must be a valid URL"))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.listen_addr.trim().is_empty() {
        return Err(ConfigError::Invalid("app.listen_addr must be non-empty"));
    }
    cfg.listen_addr()?;
    if cfg.app.base_uri.ends_with('/') {
        return Err(ConfigError::Invalid("app.base_uri must not end with '/'"));
    }

    if cfg.store.kind == StoreKind::Remote {
        cfg.remote_url()?;
    }

    for u in &cfg.auth.users {
        if u.token.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.users[].token must be non-empty"));
        }
        if u.login.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.users[].login must be non-empty"));
        }
        if u.id == 0 {
            return Err(ConfigError::Invalid("auth.users[].id must be > 0"));
        }
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"app:
  listen_addr: "127.0.0.1:8080"
  base_uri: ""
  title: "Notifications"

store:
  kind: memory
  fixtures: "./fixtures/notifications.json"
  # kind: remote
  # remote_url: "http://localhost:9090/"
  # access_token: "YOUR_ACCESS_TOKEN"

auth:
  users:
    - token: "dev-token"
      id: 1
      domain: "example.org"
      login: "gopher"
      name: "Sample Gopher"
"#
}
