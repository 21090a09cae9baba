use super::{NotificationStore, StoreError};
use crate::model::{ListOptions, Notification, RepoSpec};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// In-process notification store. Writers serialize on the lock, so
/// concurrent marks on the same repository are safe.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl MemoryStore {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            notifications: Arc::new(RwLock::new(notifications)),
        }
    }

    /// Load a JSON array of notifications.
    pub async fn from_fixtures(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read fixtures {}", path.display()))?;
        let notifications: Vec<Notification> = serde_json::from_str(&content)
            .with_context(|| format!("invalid fixtures {}", path.display()))?;
        info!(count = notifications.len(), path = %path.display(), "loaded notification fixtures");
        Ok(Self::new(notifications))
    }

    pub async fn insert(&self, n: Notification) {
        self.notifications.write().await.push(n);
    }

    pub async fn snapshot(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn list(&self, opt: &ListOptions) -> Result<Vec<Notification>, StoreError> {
        let guard = self.notifications.read().await;
        Ok(guard
            .iter()
            .filter(|n| opt.all || !n.read)
            .filter(|n| opt.repo.as_ref().map_or(true, |r| &n.repo == r))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let guard = self.notifications.read().await;
        Ok(guard.iter().filter(|n| !n.read).count() as u64)
    }

    #[instrument(skip_all)]
    async fn mark_read(
        &self,
        app_id: &str,
        repo: &RepoSpec,
        thread_id: u64,
    ) -> Result<(), StoreError> {
        let mut guard = self.notifications.write().await;
        let mut changed = 0;
        for n in guard
            .iter_mut()
            .filter(|n| n.app_id == app_id && &n.repo == repo && n.thread_id == thread_id)
        {
            if !n.read {
                n.read = true;
                changed += 1;
            }
        }
        info!(app_id, repo = %repo, thread_id, changed, "mark read");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn mark_all_read(&self, repo: &RepoSpec) -> Result<(), StoreError> {
        let mut guard = self.notifications.write().await;
        let mut changed = 0;
        for n in guard.iter_mut().filter(|n| &n.repo == repo && !n.read) {
            n.read = true;
            changed += 1;
        }
        info!(repo = %repo, changed, "mark all read");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::tests::{at, notif};

    fn store() -> MemoryStore {
        MemoryStore::new(vec![
            notif("A", 1, at(1)),
            notif("A", 2, at(2)),
            notif("B", 3, at(3)),
        ])
    }

    #[tokio::test]
    async fn list_filters_read_unless_all() {
        let s = store();
        s.mark_read("Issue", &RepoSpec::new("A"), 1).await.unwrap();

        let unread = s.list(&ListOptions::default()).await.unwrap();
        assert_eq!(unread.len(), 2);
        let all = s
            .list(&ListOptions { repo: None, all: true })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        let only_b = s
            .list(&ListOptions { repo: Some(RepoSpec::new("B")), all: false })
            .await
            .unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(s.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn marks_are_idempotent() {
        let s = store();
        let a = RepoSpec::new("A");
        s.mark_all_read(&a).await.unwrap();
        s.mark_all_read(&a).await.unwrap();
        s.mark_read("Issue", &a, 1).await.unwrap();
        assert_eq!(s.count().await.unwrap(), 1);

        // Unknown threads are not an error.
        s.mark_read("Issue", &a, 999).await.unwrap();
        s.mark_all_read(&RepoSpec::new("nope")).await.unwrap();
        assert_eq!(s.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_marks_on_same_repo_converge() {
        let s = store();
        let a = RepoSpec::new("A");
        let (one, all) = tokio::join!(s.mark_read("Issue", &a, 2), s.mark_all_read(&a));
        one.unwrap();
        all.unwrap();
        let left = s.list(&ListOptions::default()).await.unwrap();
        assert!(left.iter().all(|n| n.repo.uri == "B"));
    }

    #[tokio::test]
    async fn loads_fixtures_file() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("fixtures.json");
        let body = serde_json::to_string(&vec![notif("A", 1, at(0))]).unwrap();
        std::fs::write(&p, body).unwrap();

        let s = MemoryStore::from_fixtures(&p).await.unwrap();
        assert_eq!(s.snapshot().await.len(), 1);

        std::fs::write(&p, "not json").unwrap();
        assert!(MemoryStore::from_fixtures(&p).await.is_err());
    }
}
