//! Maps ordered repository groups into presentation-ready view models.
//!
//! Nothing here is cached: relative time labels are derived from the `now`
//! passed in, so the same groups projected at different times produce
//! different labels. Ordering is never touched and stays as `grouping` left it.
use crate::grouping::RepoGroup;
use crate::model::{Notification, RepoSpec, ThreadKey};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Threads the viewer has marked read during the current view session.
///
/// Confirmed marks went through the store. Soft marks only changed what the
/// viewer sees and never count towards a group becoming all-read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet {
    confirmed: HashSet<ThreadKey>,
    soft: HashSet<ThreadKey>,
}

impl ReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the thread was already confirmed read.
    pub fn insert(&mut self, key: ThreadKey) -> bool {
        self.soft.remove(&key);
        self.confirmed.insert(key)
    }

    /// Returns false if the thread already looked read.
    pub fn insert_soft(&mut self, key: ThreadKey) -> bool {
        if self.confirmed.contains(&key) {
            return false;
        }
        self.soft.insert(key)
    }

    pub fn contains(&self, key: &ThreadKey) -> bool {
        self.confirmed.contains(key) || self.soft.contains(key)
    }

    pub fn is_confirmed(&self, key: &ThreadKey) -> bool {
        self.confirmed.contains(key)
    }

    /// Whether `n` counts as read for its group's all-read aggregate.
    /// Soft marks do not count.
    pub fn counts_as_read(&self, n: &Notification) -> bool {
        n.read || self.is_confirmed(&n.key())
    }

    pub fn len(&self) -> usize {
        self.confirmed.len() + self.soft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeLabel {
    /// e.g. "3 hours ago".
    pub relative: String,
    /// e.g. "Nov 14, 2023, 10:13 PM UTC", for the tooltip.
    pub absolute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub key: ThreadKey,
    pub title: String,
    pub html_url: String,
    pub icon: String,
    pub color: String,
    pub actor_login: String,
    pub avatar_url: String,
    pub participating: bool,
    pub read: bool,
    pub time: TimeLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoGroupView {
    pub repo: RepoSpec,
    pub repo_url: String,
    pub repo_name: String,
    /// False hides the group's mark-all-read affordance and dims it.
    pub any_unread: bool,
    pub notifications: Vec<NotificationView>,
}

pub fn project(groups: &[RepoGroup], read_set: &ReadSet, now: DateTime<Utc>) -> Vec<RepoGroupView> {
    groups
        .iter()
        .map(|g| project_group(g, read_set, now))
        .collect()
}

fn project_group(g: &RepoGroup, read_set: &ReadSet, now: DateTime<Utc>) -> RepoGroupView {
    let mut any_unread = false;
    let notifications = g
        .notifications
        .iter()
        .map(|n| {
            if !read_set.counts_as_read(n) {
                any_unread = true;
            }
            let key = n.key();
            NotificationView {
                read: n.read || read_set.contains(&key),
                key,
                title: n.title.clone(),
                html_url: n.html_url.clone(),
                icon: n.icon.clone(),
                color: n.color.hex_string(),
                actor_login: n.actor.login.clone(),
                avatar_url: n.actor.avatar_url.clone(),
                participating: n.participating,
                time: time_label(n.updated_at, now),
            }
        })
        .collect();

    RepoGroupView {
        repo: g.repo.clone(),
        repo_url: g.repo_url.clone(),
        repo_name: g.repo.base_name().to_string(),
        any_unread,
        notifications,
    }
}

pub fn time_label(then: DateTime<Utc>, now: DateTime<Utc>) -> TimeLabel {
    TimeLabel {
        relative: relative_time(then, now),
        absolute: then.format("%b %e, %Y, %-I:%M %p UTC").to_string(),
    }
}

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;
const LONG_TIME: i64 = 37 * YEAR;

/// Upper bound (exclusive), label, and divisor for the count.
/// A divisor of zero means the label is used verbatim.
const MAGNITUDES: &[(i64, &str, i64)] = &[
    (1, "now", 0),
    (2, "1 second", 0),
    (MINUTE, "seconds", 1),
    (2 * MINUTE, "1 minute", 0),
    (HOUR, "minutes", MINUTE),
    (2 * HOUR, "1 hour", 0),
    (DAY, "hours", HOUR),
    (2 * DAY, "1 day", 0),
    (WEEK, "days", DAY),
    (2 * WEEK, "1 week", 0),
    (MONTH, "weeks", WEEK),
    (2 * MONTH, "1 month", 0),
    (YEAR, "months", MONTH),
    (18 * MONTH, "1 year", 0),
    (2 * YEAR, "2 years", 0),
    (LONG_TIME, "years", YEAR),
];

/// Human readable distance between `then` and `now`, e.g. "3 hours ago" or
/// "2 days from now".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then).num_seconds();
    let (secs, suffix) = if diff >= 0 {
        (diff, "ago")
    } else {
        (-diff, "from now")
    };

    for &(bound, label, divisor) in MAGNITUDES {
        if secs < bound {
            return match (label, divisor) {
                ("now", _) => "now".to_string(),
                (_, 0) => format!("{} {}", label, suffix),
                _ => format!("{} {} {}", secs / divisor, label, suffix),
            };
        }
    }
    format!("a long while {}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group;
    use crate::grouping::tests::{at, notif};
    use chrono::Duration;

    #[test]
    fn relative_labels() {
        let now = at(0);
        let cases = [
            (Duration::zero(), "now"),
            (Duration::seconds(1), "1 second ago"),
            (Duration::seconds(45), "45 seconds ago"),
            (Duration::seconds(90), "1 minute ago"),
            (Duration::minutes(12), "12 minutes ago"),
            (Duration::minutes(80), "1 hour ago"),
            (Duration::hours(3), "3 hours ago"),
            (Duration::hours(30), "1 day ago"),
            (Duration::days(4), "4 days ago"),
            (Duration::days(8), "1 week ago"),
            (Duration::days(22), "3 weeks ago"),
            (Duration::days(45), "1 month ago"),
            (Duration::days(200), "6 months ago"),
            (Duration::days(400), "1 year ago"),
            (Duration::days(600), "2 years ago"),
            (Duration::days(3000), "8 years ago"),
            (Duration::days(20000), "a long while ago"),
        ];
        for (ago, want) in cases {
            assert_eq!(relative_time(now - ago, now), want, "{:?}", ago);
        }
        assert_eq!(relative_time(now + Duration::hours(2), now), "2 hours from now");
    }

    #[test]
    fn label_depends_on_now() {
        let then = at(0);
        let a = time_label(then, then + Duration::minutes(5));
        let b = time_label(then, then + Duration::hours(5));
        assert_ne!(a.relative, b.relative);
        assert_eq!(a.absolute, b.absolute);
    }

    #[test]
    fn absolute_format() {
        use chrono::TimeZone;
        let t = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(time_label(t, t).absolute, "Jan  2, 2006, 3:04 PM UTC");
    }

    #[test]
    fn read_flags_follow_record_and_read_set() {
        let mut stored_read = notif("A", 2, at(1));
        stored_read.read = true;
        let groups = group(vec![notif("A", 1, at(2)), stored_read, notif("B", 3, at(0))]);

        let views = project(&groups, &ReadSet::new(), at(10));
        assert!(views[0].any_unread);
        assert!(!views[0].notifications[0].read);
        assert!(views[0].notifications[1].read);

        let mut read_set = ReadSet::new();
        read_set.insert(groups[0].notifications[0].key());
        let views = project(&groups, &read_set, at(10));
        assert!(!views[0].any_unread);
        assert!(views[0].notifications.iter().all(|n| n.read));
        assert!(views[1].any_unread);
    }

    #[test]
    fn soft_read_does_not_roll_up() {
        let groups = group(vec![notif("A", 1, at(0))]);
        let mut read_set = ReadSet::new();
        assert!(read_set.insert_soft(groups[0].notifications[0].key()));

        let views = project(&groups, &read_set, at(10));
        assert!(views[0].notifications[0].read);
        assert!(views[0].any_unread);
    }

    #[test]
    fn confirmed_supersedes_soft() {
        let key = notif("A", 1, at(0)).key();
        let mut read_set = ReadSet::new();
        assert!(read_set.insert_soft(key.clone()));
        assert!(read_set.insert(key.clone()));
        assert!(!read_set.insert(key.clone()));
        assert!(!read_set.insert_soft(key.clone()));
        assert_eq!(read_set.len(), 1);
    }

    #[test]
    fn carries_display_fields() {
        let mut n = notif("github.com/nsf/gocode", 419, at(0));
        n.participating = true;
        n.actor.login = "davidlazar".into();
        let views = project(&group(vec![n]), &ReadSet::new(), at(3 * 3600));
        let g = &views[0];
        assert_eq!(g.repo_name, "gocode");
        let v = &g.notifications[0];
        assert_eq!(v.color, "#6cc644");
        assert_eq!(v.actor_login, "davidlazar");
        assert!(v.participating);
        assert_eq!(v.time.relative, "3 hours ago");
    }
}
