//! Route paths shared by the server router and `RemoteStore`.

// Browser-facing routes, relative to wherever the app is mounted.
pub const INBOX: &str = "/";
pub const MARK_READ: &str = "/mark-read";
pub const MARK_ALL_READ: &str = "/mark-all-read";

// JSON API mirroring `NotificationStore`.
pub const API_LIST: &str = "/api/notifications/list";
pub const API_COUNT: &str = "/api/notifications/count";
pub const API_MARK_READ: &str = "/api/notifications/mark-read";
pub const API_MARK_ALL_READ: &str = "/api/notifications/mark-all-read";
