use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a repository, compared by exact equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoSpec {
    pub uri: String,
}

impl RepoSpec {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Last path segment of the URI, e.g. `gocode` for `github.com/nsf/gocode`.
    pub fn base_name(&self) -> &str {
        let trimmed = self.uri.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((_, base)) => base,
            None => trimmed,
        }
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex_string(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserSpec {
    pub id: u64,
    pub domain: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(flatten)]
    pub spec: UserSpec,
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

/// Identity of a discussion thread: `(app_id, repo, thread_id)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub app_id: String,
    pub repo: RepoSpec,
    pub thread_id: u64,
}

impl ThreadKey {
    pub fn new(app_id: impl Into<String>, repo: RepoSpec, thread_id: u64) -> Self {
        Self {
            app_id: app_id.into(),
            repo,
            thread_id,
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.repo.uri, self.app_id, self.thread_id)
    }
}

/// A single event record directed at the viewing user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub app_id: String,
    pub repo: RepoSpec,
    pub thread_id: u64,
    #[serde(default)]
    pub repo_url: String,
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: Rgb,
    #[serde(default)]
    pub actor: User,
    /// Missing timestamps decode as the Unix epoch, i.e. very old.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub participating: bool,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn key(&self) -> ThreadKey {
        ThreadKey::new(self.app_id.clone(), self.repo.clone(), self.thread_id)
    }
}

/// Filter passed to `NotificationStore::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Restrict to a single repository.
    pub repo: Option<RepoSpec>,
    /// Include already-read notifications.
    pub all: bool,
}

/// Body of `POST /mark-read`.
///
/// All three fields empty means a soft mark: the caller only wants local
/// state to flip, someone else takes care of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkReadRequest {
    #[serde(rename = "appID", alias = "AppID", default)]
    pub app_id: String,
    #[serde(rename = "repoURI", alias = "RepoURI", default)]
    pub repo_uri: String,
    #[serde(rename = "threadID", alias = "ThreadID", default)]
    pub thread_id: u64,
}

impl MarkReadRequest {
    pub fn for_thread(key: &ThreadKey) -> Self {
        Self {
            app_id: key.app_id.clone(),
            repo_uri: key.repo.uri.clone(),
            thread_id: key.thread_id,
        }
    }

    pub fn is_soft(&self) -> bool {
        self.app_id.is_empty() && self.repo_uri.is_empty() && self.thread_id == 0
    }

    pub fn thread_key(&self) -> ThreadKey {
        ThreadKey::new(self.app_id.clone(), RepoSpec::new(self.repo_uri.clone()), self.thread_id)
    }
}

/// Body of `POST /mark-all-read`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkAllReadRequest {
    #[serde(rename = "repoURI", alias = "RepoURI", default)]
    pub repo_uri: String,
}

/// A transient read-state instruction flowing from the UI to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStateChange {
    Thread(ThreadKey),
    Repo(RepoSpec),
}

impl ReadStateChange {
    pub fn kind(&self) -> &'static str {
        match self {
            ReadStateChange::Thread(_) => "mark_read",
            ReadStateChange::Repo(_) => "mark_all_read",
        }
    }

    pub fn repo(&self) -> &RepoSpec {
        match self {
            ReadStateChange::Thread(key) => &key.repo,
            ReadStateChange::Repo(repo) => repo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_takes_last_segment() {
        assert_eq!(RepoSpec::new("github.com/nsf/gocode").base_name(), "gocode");
        assert_eq!(RepoSpec::new("github.com/nsf/gocode/").base_name(), "gocode");
        assert_eq!(RepoSpec::new("local").base_name(), "local");
    }

    #[test]
    fn rgb_hex() {
        assert_eq!(Rgb::new(108, 198, 68).hex_string(), "#6cc644");
        assert_eq!(Rgb::new(0, 0, 0).hex_string(), "#000000");
    }

    #[test]
    fn mark_read_request_accepts_both_casings() {
        let a: MarkReadRequest =
            serde_json::from_str(r#"{"appID":"Issue","repoURI":"r","threadID":3}"#).unwrap();
        let b: MarkReadRequest =
            serde_json::from_str(r#"{"AppID":"Issue","RepoURI":"r","ThreadID":3}"#).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_soft());
        assert_eq!(a.thread_key(), ThreadKey::new("Issue", RepoSpec::new("r"), 3));
    }

    #[test]
    fn empty_mark_read_request_is_soft() {
        let req: MarkReadRequest = serde_json::from_str("{}").unwrap();
        assert!(req.is_soft());
    }

    #[test]
    fn notification_defaults_missing_fields() {
        let n: Notification = serde_json::from_str(
            r#"{"app_id":"Issue","repo":{"uri":"r"},"thread_id":1,"title":"t"}"#,
        )
        .unwrap();
        assert_eq!(n.updated_at, DateTime::<Utc>::default());
        assert!(!n.read);
        assert!(!n.participating);
    }
}
