use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum Error {
    #[error("this page requires an authenticated user")]
    Unauthorized,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("user service: {0}")]
    Auth(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) | Error::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(err = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_distinct_from_store_failure() {
        assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        let store = Error::from(StoreError::Unavailable("down".into()));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::MalformedRequest("missing repoURI".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
