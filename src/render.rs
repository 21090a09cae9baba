//! HTML rendering of projected inbox views.
use crate::config::Config;
use crate::projection::{NotificationView, RepoGroupView};
use serde::Serialize;

/// Page chrome supplied by the embedding application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub title: String,
    /// Raw HTML appended to `<head>`.
    pub head_pre: String,
    /// Raw HTML opened at the top of `<body>`.
    pub body_pre: String,
    /// Prefix for the script's POST targets, e.g. `/notifications`.
    pub base_uri: String,
}

impl PageOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            title: cfg.app.title.clone(),
            head_pre: cfg.app.head_pre.clone(),
            body_pre: cfg.app.body_pre.clone(),
            base_uri: cfg.app.base_uri.clone(),
        }
    }
}

#[derive(Serialize)]
struct PageState<'a> {
    #[serde(rename = "BaseURI")]
    base_uri: &'a str,
}

pub const EMPTY_STATE: &str = "No new notifications.";

pub fn render_page(opts: &PageOptions, groups: &[RepoGroupView]) -> String {
    let state = serde_json::to_string(&PageState {
        base_uri: &opts.base_uri,
    })
    .unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>{style}</style>
    <script>var State = {state};</script>
    <script>{script}</script>
    {head_pre}
  </head>
  <body>
    {body_pre}
    <main>
{body}
    </main>
  </body>
</html>"#,
        title = html_escape(&opts.title),
        style = DEFAULT_STYLE,
        state = script_safe(&state),
        script = INBOX_SCRIPT,
        head_pre = opts.head_pre,
        body_pre = opts.body_pre,
        body = render_groups(groups),
    )
}

pub fn render_groups(groups: &[RepoGroupView]) -> String {
    if groups.is_empty() {
        return format!(
            "<div style=\"text-align: center; margin-top: 80px; margin-bottom: 80px;\">{}</div>\n",
            EMPTY_STATE
        );
    }
    groups.iter().map(render_group).collect()
}

fn render_group(g: &RepoGroupView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<div class=\"RepoNotifications list-entry list-entry-border mark-as-read{}\" data-repo=\"{}\">\n",
        if g.any_unread { "" } else { " read" },
        html_attr(&g.repo.uri)
    ));
    out.push_str("<div class=\"list-entry-header\">");
    out.push_str(&format!(
        "<span class=\"content\"><a class=\"black\" href=\"{}\"><strong>{}</strong></a></span>",
        html_attr(&g.repo_url),
        html_escape(&g.repo.uri)
    ));
    if g.any_unread {
        out.push_str(&format!(
            "<span class=\"right-icon hide-when-read\"><a href=\"javascript:\" onclick=\"{}\" title=\"Mark all {} notifications as read\">{}</a></span>",
            html_attr(&format!("MarkAllRead(this, {});", js_string(&g.repo.uri))),
            html_attr(&g.repo_name),
            CHECK_ICON
        ));
    }
    out.push_str("</div>\n");
    for n in &g.notifications {
        out.push_str(&render_notification(n));
    }
    out.push_str("</div>\n");
    out
}

fn render_notification(n: &NotificationView) -> String {
    let mut classes = String::from("list-entry-body multilist-entry mark-as-read");
    if n.read {
        classes.push_str(" read");
    }
    if n.participating {
        classes.push_str(" participating");
    }

    let avatar = if n.avatar_url.is_empty() {
        String::new()
    } else {
        format!(
            "<img class=\"avatar fade-when-read\" title=\"@{}\" src=\"{}\">",
            html_attr(&n.actor_login),
            html_attr(&n.avatar_url)
        )
    };

    let mark_read = format!(
        "MarkRead(this, {}, {}, {});",
        js_string(&n.key.app_id),
        js_string(&n.key.repo.uri),
        n.key.thread_id
    );

    format!(
        concat!(
            "<div class=\"{classes}\" data-app=\"{app}\" data-thread=\"{thread}\">",
            "<span class=\"content\"><table style=\"width: 100%;\"><tr>",
            "<td class=\"notification\" style=\"width: 70%;\">",
            "<span class=\"fade-when-read octicon octicon-{icon}\" style=\"color: {color}; margin-right: 6px; vertical-align: top;\"></span>",
            "<a class=\"black gray-when-read\" onclick=\"MarkRead(this, &quot;&quot;, &quot;&quot;, 0);\" href=\"{href}\">{title}</a>",
            "</td><td>{avatar}<span class=\"tiny gray-when-read\"><abbr title=\"{absolute}\">{relative}</abbr></span></td>",
            "</tr></table></span>",
            "<span class=\"right-icon hide-when-read\"><a href=\"javascript:\" onclick=\"{mark_read}\" title=\"Mark as read\">{check}</a></span>",
            "</div>\n"
        ),
        classes = classes,
        app = html_attr(&n.key.app_id),
        thread = n.key.thread_id,
        icon = html_attr(&n.icon),
        color = html_attr(&n.color),
        href = html_attr(&n.html_url),
        title = html_escape(&n.title),
        avatar = avatar,
        absolute = html_attr(&n.time.absolute),
        relative = html_escape(&n.time.relative),
        mark_read = html_attr(&mark_read),
        check = CHECK_ICON,
    )
}

/// JSON string literal, usable as a JavaScript argument.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Keep inline JSON from closing the surrounding `<script>`.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn html_attr(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

const CHECK_ICON: &str = "<span class=\"octicon octicon-check\">&#10003;</span>";

const INBOX_SCRIPT: &str = r#"
function ancestorWithClass(el, cls) {
  while (el && !(el.classList && el.classList.contains(cls))) { el = el.parentElement; }
  return el;
}

function postJSON(path, body) {
  return fetch(State.BaseURI + path, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    credentials: "same-origin",
    body: JSON.stringify(body)
  });
}

function MarkRead(el, appID, repoURI, threadID) {
  var entry = ancestorWithClass(el, "mark-as-read");
  if (appID === "" && repoURI === "" && threadID === 0) {
    if (entry && !entry.classList.contains("read")) { entry.classList.add("read", "soft-read"); }
    return;
  }
  postJSON("/mark-read", { appID: appID, repoURI: repoURI, threadID: threadID })
    .then(function (resp) {
      if (resp.status !== 200) { console.log("did not get acceptable status code: " + resp.status); return; }
      if (!entry || !entry.isConnected) { return; }
      entry.classList.remove("soft-read");
      entry.classList.add("read");
      var repo = ancestorWithClass(entry, "RepoNotifications");
      if (!repo) { return; }
      var unread = repo.querySelectorAll(
        ".list-entry-body.mark-as-read:not(.read), .list-entry-body.mark-as-read.soft-read");
      if (unread.length === 0) { repo.classList.add("read"); }
    })
    .catch(function (err) { console.log(err); });
}

function MarkAllRead(el, repoURI) {
  postJSON("/mark-all-read", { repoURI: repoURI })
    .then(function (resp) {
      if (resp.status !== 200) { console.log("did not get acceptable status code: " + resp.status); return; }
      var repo = ancestorWithClass(el, "RepoNotifications");
      if (!repo || !repo.isConnected) { return; }
      repo.classList.add("read");
      repo.querySelectorAll(".mark-as-read").forEach(function (n) {
        n.classList.remove("soft-read");
        n.classList.add("read");
      });
    })
    .catch(function (err) { console.log(err); });
}
"#;

const DEFAULT_STYLE: &str = r#"
body {
  margin: 20px;
  font-family: "Helvetica Neue", Helvetica, Arial, sans-serif;
  font-size: 14px;
  color: #373a3c;
}

main {
  max-width: 800px;
  margin: 0 auto 100px auto;
}

a.black, a.black:hover {
  color: #373a3c;
}

.list-entry {
  margin-bottom: 20px;
}

.list-entry-border {
  border: 1px solid #ddd;
  border-radius: 4px;
}

.list-entry-header {
  display: flex;
  padding: 10px;
  background-color: #f8f8f8;
  border-bottom: 1px solid #eee;
}

.list-entry-body {
  display: flex;
  padding: 10px;
}

.multilist-entry + .multilist-entry {
  border-top: 1px solid #eee;
}

.content {
  flex-grow: 1;
}

.right-icon a {
  color: #bbb;
  text-decoration: none;
}

.right-icon a:hover {
  color: #4183c4;
}

.participating a.black {
  font-weight: bold;
}

.avatar {
  width: 18px;
  height: 18px;
  border-radius: 2px;
  vertical-align: middle;
  margin-right: 4px;
}

.tiny {
  font-size: 12px;
}

.read .hide-when-read {
  display: none;
}

.read .fade-when-read {
  opacity: 0.5;
}

.read .gray-when-read, .read.gray-when-read {
  color: #bbb;
}
"#;
