use super::{NotificationStore, StoreError};
use crate::model::{ListOptions, Notification, RepoSpec};
use crate::routes;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, instrument, warn};

/// `NotificationStore` served remotely over the JSON API in [`crate::app`].
#[derive(Clone)]
pub struct RemoteStore {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RemoteStore {
    pub fn new(base_url: Url, access_token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent("notifications-app/0.1")
            .no_proxy()
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url,
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn build_request(
        &self,
        method: Method,
        route: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Request, StoreError> {
        // Routes are absolute; keep any path prefix the base URL carries.
        let path = format!("{}{}", self.base_url.path().trim_end_matches('/'), route);
        let mut url = self.base_url.clone();
        url.set_path(&path);
        let mut req = self.http.request(method, url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        req.build().map_err(StoreError::from)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, StoreError> {
        debug!(method = %request.method(), url = %request.url(), "sending store request");
        let res = self.http.execute(request).await?;
        if res.status() != StatusCode::OK {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            warn!(status, %body, "store request rejected");
            return Err(StoreError::Status { status, body });
        }
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let request = self.build_request(Method::GET, route, query)?;
        let res = self.execute(request).await?;
        res.json::<T>()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    async fn post(&self, route: &str, query: &[(&str, String)]) -> Result<(), StoreError> {
        let request = self.build_request(Method::POST, route, query)?;
        self.execute(request).await?;
        Ok(())
    }
}

pub fn list_query(opt: &ListOptions) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    if let Some(repo) = &opt.repo {
        q.push(("RepoURI", repo.uri.clone()));
    }
    if opt.all {
        q.push(("All", "true".to_string()));
    }
    q
}

#[async_trait]
impl NotificationStore for RemoteStore {
    #[instrument(skip_all)]
    async fn list(&self, opt: &ListOptions) -> Result<Vec<Notification>, StoreError> {
        self.get_json(routes::API_LIST, &list_query(opt)).await
    }

    #[instrument(skip_all)]
    async fn count(&self) -> Result<u64, StoreError> {
        self.get_json(routes::API_COUNT, &[]).await
    }

    #[instrument(skip_all)]
    async fn mark_read(
        &self,
        app_id: &str,
        repo: &RepoSpec,
        thread_id: u64,
    ) -> Result<(), StoreError> {
        self.post(
            routes::API_MARK_READ,
            &[
                ("AppID", app_id.to_string()),
                ("RepoURI", repo.uri.clone()),
                ("ThreadID", thread_id.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip_all)]
    async fn mark_all_read(&self, repo: &RepoSpec) -> Result<(), StoreError> {
        self.post(routes::API_MARK_ALL_READ, &[("RepoURI", repo.uri.clone())])
            .await
    }
}
