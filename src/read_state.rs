//! Read-state transitions.
//!
//! Server side, a [`ReadStateChange`] is validated and handed to the store.
//! Client side, [`ReadStateController`] keeps the viewer's inbox view model and
//! flips it only after the store confirmed a mutation. Soft marks are the one
//! exception and never reach the store.
//!
//! Per notification the only transition is Unread -> Read. A group is AllRead
//! when none of its members is unread; that is recomputed from member state
//! every time, so a mark-read racing a mark-all-read still ends AllRead.
use crate::grouping::{self, RepoGroup};
use crate::model::{
    ListOptions, MarkAllReadRequest, MarkReadRequest, ReadStateChange, RepoSpec, ThreadKey,
};
use crate::projection::{self, ReadSet, RepoGroupView};
use crate::store::{NotificationStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum ReadStateError {
    #[error("malformed request: {0}")]
    Malformed(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReadStateError> for crate::error::Error {
    fn from(err: ReadStateError) -> Self {
        match err {
            ReadStateError::Malformed(msg) => {
                crate::error::Error::MalformedRequest(msg.to_string())
            }
            ReadStateError::Store(err) => crate::error::Error::Store(err),
        }
    }
}

impl ReadStateChange {
    /// Rejects requests that cannot identify a thread. Soft requests are
    /// rejected too: they are never meant to reach the store.
    pub fn from_mark_read(req: &MarkReadRequest) -> Result<Self, ReadStateError> {
        if req.is_soft() {
            return Err(ReadStateError::Malformed("soft mark-read has no store counterpart"));
        }
        if req.app_id.trim().is_empty() {
            return Err(ReadStateError::Malformed("appID is required"));
        }
        if req.repo_uri.trim().is_empty() {
            return Err(ReadStateError::Malformed("repoURI is required"));
        }
        Ok(ReadStateChange::Thread(req.thread_key()))
    }

    pub fn from_mark_all_read(req: &MarkAllReadRequest) -> Result<Self, ReadStateError> {
        if req.repo_uri.trim().is_empty() {
            return Err(ReadStateError::Malformed("repoURI is required"));
        }
        Ok(ReadStateChange::Repo(RepoSpec::new(req.repo_uri.clone())))
    }
}

/// Send a validated change to the store. No retries.
#[instrument(skip_all, fields(kind = change.kind(), repo = %change.repo()))]
pub async fn apply(
    store: &dyn NotificationStore,
    change: &ReadStateChange,
) -> Result<(), StoreError> {
    let res = match change {
        ReadStateChange::Thread(key) => {
            store
                .mark_read(&key.app_id, &key.repo, key.thread_id)
                .await
        }
        ReadStateChange::Repo(repo) => store.mark_all_read(repo).await,
    };
    match &res {
        Ok(()) => info!("read state changed"),
        Err(err) => warn!(?err, "read state change failed"),
    }
    res
}

/// Outcome of a client-side read-state operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Only the local view flipped; nothing was sent.
    SoftRead,
    /// The store confirmed and the thread is now read.
    Read { group_all_read: bool },
    /// The store confirmed and every member of the group is now read.
    AllRead,
    /// Already read; nothing was sent.
    AlreadyRead,
    /// The store confirmed but the target is no longer in the view.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    HasUnread,
    AllRead,
}

/// The viewer's current inbox: the last fetched snapshot plus what they
/// marked read since.
#[derive(Debug, Clone, Default)]
pub struct InboxView {
    groups: Vec<RepoGroup>,
    read_set: ReadSet,
}

impl InboxView {
    pub fn new(groups: Vec<RepoGroup>) -> Self {
        Self {
            groups,
            read_set: ReadSet::new(),
        }
    }

    pub fn groups(&self) -> &[RepoGroup] {
        &self.groups
    }

    pub fn read_set(&self) -> &ReadSet {
        &self.read_set
    }

    fn group(&self, repo: &RepoSpec) -> Option<&RepoGroup> {
        self.groups.iter().find(|g| &g.repo == repo)
    }

    fn contains(&self, key: &ThreadKey) -> bool {
        self.group(&key.repo)
            .map_or(false, |g| g.notifications.iter().any(|n| n.key() == *key))
    }

    fn is_read(&self, key: &ThreadKey) -> bool {
        self.group(&key.repo)
            .and_then(|g| g.notifications.iter().find(|n| n.key() == *key))
            .map_or(false, |n| self.read_set.counts_as_read(n))
    }

    pub fn group_state(&self, repo: &RepoSpec) -> Option<GroupState> {
        let g = self.group(repo)?;
        if g.notifications.iter().all(|n| self.read_set.counts_as_read(n)) {
            Some(GroupState::AllRead)
        } else {
            Some(GroupState::HasUnread)
        }
    }

    pub fn render(&self, now: DateTime<Utc>) -> Vec<RepoGroupView> {
        projection::project(&self.groups, &self.read_set, now)
    }
}

/// Client-side driver for mark-read and mark-all-read.
///
/// The lock only guards the view model and is never held across a store call.
/// Consistency of concurrent mutations is the store's job.
#[derive(Clone)]
pub struct ReadStateController {
    store: Arc<dyn NotificationStore>,
    view: Arc<Mutex<InboxView>>,
}

impl ReadStateController {
    pub fn new(store: Arc<dyn NotificationStore>, groups: Vec<RepoGroup>) -> Self {
        Self {
            store,
            view: Arc::new(Mutex::new(InboxView::new(groups))),
        }
    }

    /// Fetch from the store and replace the view. Completions of operations
    /// started against the old view are discarded if their target is gone.
    pub async fn refresh(&self, opt: &ListOptions) -> Result<(), StoreError> {
        let notifications = self.store.list(opt).await?;
        let groups = grouping::group(notifications);
        debug!(groups = groups.len(), "inbox refreshed");
        *self.view.lock().await = InboxView::new(groups);
        Ok(())
    }

    pub async fn snapshot(&self) -> InboxView {
        self.view.lock().await.clone()
    }

    pub async fn render(&self, now: DateTime<Utc>) -> Vec<RepoGroupView> {
        self.view.lock().await.render(now)
    }

    pub async fn group_state(&self, repo: &RepoSpec) -> Option<GroupState> {
        self.view.lock().await.group_state(repo)
    }

    /// Mark `target` read. `req` carries the store identifiers and must name
    /// `target`; an all-empty request is a soft mark that only flips `target`
    /// locally and leaves the group's aggregate alone.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn mark_read(
        &self,
        target: &ThreadKey,
        req: &MarkReadRequest,
    ) -> Result<Transition, ReadStateError> {
        if req.is_soft() {
            let mut view = self.view.lock().await;
            if !view.contains(target) {
                return Ok(Transition::Discarded);
            }
            if view.is_read(target) || !view.read_set.insert_soft(target.clone()) {
                return Ok(Transition::AlreadyRead);
            }
            return Ok(Transition::SoftRead);
        }

        let change = ReadStateChange::from_mark_read(req)?;
        if req.thread_key() != *target {
            return Err(ReadStateError::Malformed("request does not name the target thread"));
        }
        if self.view.lock().await.is_read(target) {
            return Ok(Transition::AlreadyRead);
        }

        apply(self.store.as_ref(), &change).await?;

        let mut view = self.view.lock().await;
        if !view.contains(target) {
            debug!("mark read completed for a thread no longer shown");
            return Ok(Transition::Discarded);
        }
        view.read_set.insert(target.clone());
        let group_all_read = view.group_state(&target.repo) == Some(GroupState::AllRead);
        Ok(Transition::Read { group_all_read })
    }

    #[instrument(skip_all, fields(repo = %req.repo_uri))]
    pub async fn mark_all_read(
        &self,
        req: &MarkAllReadRequest,
    ) -> Result<Transition, ReadStateError> {
        let change = ReadStateChange::from_mark_all_read(req)?;
        let repo = change.repo().clone();
        if self.view.lock().await.group_state(&repo) == Some(GroupState::AllRead) {
            return Ok(Transition::AlreadyRead);
        }

        apply(self.store.as_ref(), &change).await?;

        let mut view = self.view.lock().await;
        let keys: Vec<ThreadKey> = match view.group(&repo) {
            Some(g) => g.notifications.iter().map(|n| n.key()).collect(),
            None => return Ok(Transition::Discarded),
        };
        for key in keys {
            view.read_set.insert(key);
        }
        Ok(Transition::AllRead)
    }

    /// Run `mark_read` in the background so the caller is not blocked.
    pub fn spawn_mark_read(
        &self,
        target: ThreadKey,
        req: MarkReadRequest,
    ) -> JoinHandle<Result<Transition, ReadStateError>> {
        let this = self.clone();
        tokio::spawn(async move { this.mark_read(&target, &req).await })
    }

    pub fn spawn_mark_all_read(
        &self,
        req: MarkAllReadRequest,
    ) -> JoinHandle<Result<Transition, ReadStateError>> {
        let this = self.clone();
        tokio::spawn(async move { this.mark_all_read(&req).await })
    }
}
