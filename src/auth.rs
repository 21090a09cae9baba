//! Viewer identity. Authentication itself belongs to the embedding
//! application; this module only asks it who is looking.
use crate::config::AuthUser;
use crate::model::{User, UserSpec};
use anyhow::Result;
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;

#[async_trait]
pub trait UserService: Send + Sync {
    /// `Ok(None)` means the request carries no authenticated viewer.
    async fn authenticated(&self, headers: &HeaderMap) -> Result<Option<User>>;
}

/// Resolves bearer tokens (or an `accessToken` cookie) against a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    users: HashMap<String, User>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(users: &[AuthUser]) -> Self {
        let mut out = Self::new();
        for u in users {
            out.add(
                u.token.clone(),
                User {
                    spec: UserSpec {
                        id: u.id,
                        domain: u.domain.clone(),
                    },
                    login: u.login.clone(),
                    name: u.name.clone(),
                    avatar_url: u.avatar_url.clone(),
                    html_url: String::new(),
                },
            );
        }
        out
    }

    pub fn add(&mut self, token: String, user: User) {
        self.users.insert(token, user);
    }
}

#[async_trait]
impl UserService for StaticTokens {
    async fn authenticated(&self, headers: &HeaderMap) -> Result<Option<User>> {
        Ok(request_token(headers).and_then(|t| self.users.get(t).cloned()))
    }
}

/// Bearer token from `Authorization`, falling back to the `accessToken` cookie.
pub fn request_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim());
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "accessToken")
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn users() -> StaticTokens {
        StaticTokens::from_config(&[AuthUser {
            token: "t0k".into(),
            id: 1,
            domain: "example.org".into(),
            login: "gopher".into(),
            name: "Sample Gopher".into(),
            avatar_url: String::new(),
        }])
    }

    #[tokio::test]
    async fn resolves_bearer_and_cookie() {
        let svc = users();

        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));
        let u = svc.authenticated(&h).await.unwrap().unwrap();
        assert_eq!(u.login, "gopher");
        assert_eq!(u.spec.id, 1);

        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; accessToken=t0k"));
        assert!(svc.authenticated(&h).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_anonymous() {
        let svc = users();
        assert!(svc.authenticated(&HeaderMap::new()).await.unwrap().is_none());

        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(svc.authenticated(&h).await.unwrap().is_none());
    }
}
