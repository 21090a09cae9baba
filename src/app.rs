//! HTTP surface: the HTML inbox with its mark-read endpoints, plus the JSON
//! API that `RemoteStore` talks to.
use crate::auth::UserService;
use crate::error::Error;
use crate::grouping;
use crate::model::{
    ListOptions, MarkAllReadRequest, MarkReadRequest, Notification, ReadStateChange, RepoSpec, User,
};
use crate::projection::{self, ReadSet};
use crate::read_state;
use crate::render::{self, PageOptions};
use crate::routes;
use crate::store::NotificationStore;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything a handler needs, built once at startup and shared.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NotificationStore>,
    pub users: Arc<dyn UserService>,
    pub page: Arc<PageOptions>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        users: Arc<dyn UserService>,
        page: PageOptions,
    ) -> Self {
        Self {
            store,
            users,
            page: Arc::new(page),
        }
    }

    async fn require_user(&self, headers: &HeaderMap) -> Result<User, Error> {
        match self.users.authenticated(headers).await {
            Ok(Some(user)) if user.spec.id != 0 => Ok(user),
            Ok(_) => Err(Error::Unauthorized),
            Err(err) => Err(Error::Auth(err.to_string())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(routes::INBOX, get(inbox))
        .route(routes::MARK_READ, post(mark_read))
        .route(routes::MARK_ALL_READ, post(mark_all_read))
        .route(routes::API_LIST, get(api_list))
        .route(routes::API_COUNT, get(api_count))
        .route(routes::API_MARK_READ, post(api_mark_read))
        .route(routes::API_MARK_ALL_READ, post(api_mark_all_read))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    all: Option<String>,
}

/// Lenient boolean parsing; anything unrecognised is false.
fn parse_bool(v: Option<&str>) -> bool {
    matches!(v, Some("1" | "t" | "T" | "true" | "TRUE" | "True"))
}

#[instrument(skip_all)]
async fn inbox(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<InboxQuery>,
) -> Result<Html<String>, Error> {
    let user = state.require_user(&headers).await?;
    let opt = ListOptions {
        repo: None,
        all: parse_bool(q.all.as_deref()),
    };
    let notifications = state.store.list(&opt).await?;
    let groups = grouping::group(notifications);
    let views = projection::project(&groups, &ReadSet::new(), Utc::now());
    info!(user = %user.login, groups = views.len(), all = opt.all, "rendered inbox");
    Ok(Html(render::render_page(&state.page, &views)))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|err| Error::MalformedRequest(err.to_string()))
}

#[instrument(skip_all)]
async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(), Error> {
    state.require_user(&headers).await?;
    let req: MarkReadRequest = decode(&body)?;
    let change = ReadStateChange::from_mark_read(&req)?;
    read_state::apply(state.store.as_ref(), &change).await?;
    Ok(())
}

#[instrument(skip_all)]
async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(), Error> {
    state.require_user(&headers).await?;
    let req: MarkAllReadRequest = decode(&body)?;
    let change = ReadStateChange::from_mark_all_read(&req)?;
    read_state::apply(state.store.as_ref(), &change).await?;
    Ok(())
}

/// Single value of a query parameter that may appear at most once.
fn single<'a>(q: &'a [(String, String)], name: &str) -> Result<Option<&'a str>, Error> {
    let mut values = q.iter().filter(|(k, _)| k == name).map(|(_, v)| v.as_str());
    let first = values.next();
    let rest = values.count();
    if rest > 0 {
        return Err(Error::MalformedRequest(format!(
            "only one {} parameter expected, but got {}",
            name,
            rest + 1
        )));
    }
    Ok(first)
}

#[instrument(skip_all)]
async fn api_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Notification>>, Error> {
    state.require_user(&headers).await?;
    let opt = ListOptions {
        repo: single(&q, "RepoURI")?.map(RepoSpec::new),
        all: parse_bool(single(&q, "All")?),
    };
    Ok(Json(state.store.list(&opt).await?))
}

#[instrument(skip_all)]
async fn api_count(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<u64>, Error> {
    state.require_user(&headers).await?;
    Ok(Json(state.store.count().await?))
}

#[instrument(skip_all)]
async fn api_mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<Vec<(String, String)>>,
) -> Result<(), Error> {
    state.require_user(&headers).await?;
    let thread_id = single(&q, "ThreadID")?
        .unwrap_or_default()
        .parse::<u64>()
        .map_err(|err| {
            Error::MalformedRequest(format!("parsing ThreadID query parameter: {}", err))
        })?;
    let req = MarkReadRequest {
        app_id: single(&q, "AppID")?.unwrap_or_default().to_string(),
        repo_uri: single(&q, "RepoURI")?.unwrap_or_default().to_string(),
        thread_id,
    };
    let change = ReadStateChange::from_mark_read(&req)?;
    read_state::apply(state.store.as_ref(), &change).await?;
    Ok(())
}

#[instrument(skip_all)]
async fn api_mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<Vec<(String, String)>>,
) -> Result<(), Error> {
    state.require_user(&headers).await?;
    let req = MarkAllReadRequest {
        repo_uri: single(&q, "RepoURI")?.unwrap_or_default().to_string(),
    };
    let change = ReadStateChange::from_mark_all_read(&req)?;
    read_state::apply(state.store.as_ref(), &change).await?;
    Ok(())
}
