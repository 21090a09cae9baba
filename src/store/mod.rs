//! Notification store capability and its implementations.
//!
//! The store owns persisted notification content and read state. Everything
//! else in the crate consumes it through [`NotificationStore`]:
//! - `memory`: in-process store for development and tests.
//! - `remote`: client for the JSON API served by another instance.

pub mod memory;
pub mod remote;

use crate::model::{ListOptions, Notification, RepoSpec};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use remote::RemoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("notification store unavailable: {0}")]
    Unavailable(String),
    #[error("did not get acceptable status code: {status} body: {body:?}")]
    Status { status: u16, body: String },
    #[error("invalid store response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Marks are idempotent: marking read state that is already read succeeds
/// without changing anything.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn list(&self, opt: &ListOptions) -> Result<Vec<Notification>, StoreError>;

    /// Number of unread notifications.
    async fn count(&self) -> Result<u64, StoreError>;

    async fn mark_read(
        &self,
        app_id: &str,
        repo: &RepoSpec,
        thread_id: u64,
    ) -> Result<(), StoreError>;

    async fn mark_all_read(&self, repo: &RepoSpec) -> Result<(), StoreError>;
}
