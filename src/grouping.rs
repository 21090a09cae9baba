//! Groups a flat notification list by repository and orders it by recency.
use crate::model::{Notification, RepoSpec};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A repository's notifications bundled for display. Built fresh for every
/// render and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoGroup {
    pub repo: RepoSpec,
    pub repo_url: String,
    /// Most recent first.
    pub notifications: Vec<Notification>,
    /// Maximum `updated_at` among `notifications`.
    pub most_recent_updated_at: DateTime<Utc>,
}

impl RepoGroup {
    fn new(first: Notification) -> Self {
        Self {
            repo: first.repo.clone(),
            repo_url: first.repo_url.clone(),
            most_recent_updated_at: first.updated_at,
            notifications: vec![first],
        }
    }

    fn push(&mut self, n: Notification) {
        if n.updated_at > self.most_recent_updated_at {
            self.most_recent_updated_at = n.updated_at;
        }
        if self.repo_url.is_empty() {
            self.repo_url = n.repo_url.clone();
        }
        self.notifications.push(n);
    }
}

/// Partition `notifications` by repository, most recently active group first.
///
/// Both sorts are stable: equal timestamps keep input order, and groups with
/// equal recency keep the order in which their repository first appeared.
pub fn group(notifications: Vec<Notification>) -> Vec<RepoGroup> {
    let mut index: HashMap<RepoSpec, usize> = HashMap::new();
    let mut groups: Vec<RepoGroup> = Vec::new();

    for n in notifications {
        match index.get(&n.repo) {
            Some(&i) => groups[i].push(n),
            None => {
                index.insert(n.repo.clone(), groups.len());
                groups.push(RepoGroup::new(n));
            }
        }
    }

    for g in groups.iter_mut() {
        g.notifications.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
    groups.sort_by(|a, b| b.most_recent_updated_at.cmp(&a.most_recent_updated_at));
    groups
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Rgb, User};
    use chrono::TimeZone;

    pub(crate) fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    pub(crate) fn notif(repo: &str, thread_id: u64, updated_at: DateTime<Utc>) -> Notification {
        Notification {
            app_id: "Issue".into(),
            repo: RepoSpec::new(repo),
            thread_id,
            repo_url: format!("https://{}", repo),
            title: format!("thread {}", thread_id),
            html_url: format!("https://{}/issues/{}", repo, thread_id),
            icon: "issue-opened".into(),
            color: Rgb::new(108, 198, 68),
            actor: User::default(),
            updated_at,
            participating: false,
            read: false,
        }
    }

    fn ids(g: &RepoGroup) -> Vec<u64> {
        g.notifications.iter().map(|n| n.thread_id).collect()
    }

    #[test]
    fn groups_by_repo_and_sorts_by_recency() {
        let (t1, t2, t3) = (at(1), at(2), at(3));
        let out = group(vec![notif("A", 1, t1), notif("B", 2, t2), notif("A", 3, t3)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].repo.uri, "A");
        assert_eq!(out[0].most_recent_updated_at, t3);
        assert_eq!(ids(&out[0]), vec![3, 1]);
        assert_eq!(out[1].repo.uri, "B");
        assert_eq!(out[1].most_recent_updated_at, t2);
        assert_eq!(ids(&out[1]), vec![2]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group(Vec::new()).is_empty());
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let t = at(10);
        let input = vec![
            notif("A", 5, t),
            notif("B", 6, t),
            notif("A", 7, t),
            notif("C", 8, t),
        ];
        let out = group(input.clone());
        let repos: Vec<&str> = out.iter().map(|g| g.repo.uri.as_str()).collect();
        assert_eq!(repos, vec!["A", "B", "C"]);
        assert_eq!(ids(&out[0]), vec![5, 7]);
        assert_eq!(group(input), out);
    }

    #[test]
    fn epoch_timestamp_sorts_last() {
        let out = group(vec![
            notif("old", 1, DateTime::<Utc>::default()),
            notif("new", 2, at(0)),
        ]);
        assert_eq!(out[0].repo.uri, "new");
        assert_eq!(out[1].repo.uri, "old");
    }

    #[test]
    fn partition_and_ordering_hold_for_mixed_input() {
        let input: Vec<Notification> = (0..40u64)
            .map(|i| {
                let repo = format!("repo-{}", (i * 7) % 5);
                notif(&repo, i, at(((i * 13) % 17) as i64))
            })
            .collect();
        let out = group(input.clone());

        let total: usize = out.iter().map(|g| g.notifications.len()).sum();
        assert_eq!(total, input.len());
        for g in &out {
            assert!(!g.notifications.is_empty());
            assert!(g.notifications.iter().all(|n| n.repo == g.repo));
            let max = g.notifications.iter().map(|n| n.updated_at).max().unwrap();
            assert_eq!(g.most_recent_updated_at, max);
            assert!(g
                .notifications
                .windows(2)
                .all(|w| w[0].updated_at >= w[1].updated_at));
        }
        assert!(out
            .windows(2)
            .all(|w| w[0].most_recent_updated_at >= w[1].most_recent_updated_at));
        let repos: std::collections::HashSet<&RepoSpec> = out.iter().map(|g| &g.repo).collect();
        assert_eq!(repos.len(), out.len());
    }
}
