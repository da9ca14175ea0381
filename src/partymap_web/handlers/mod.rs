use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub mod catalog;
pub mod map;
pub mod nearby;

pub struct WebError {
    status: StatusCode,
    err: anyhow::Error,
}

impl WebError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, err: err.into() }
    }

    pub fn not_found(err: impl Into<anyhow::Error>) -> Self {
        Self { status: StatusCode::NOT_FOUND, err: err.into() }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, self.err.to_string()).into_response()
    }
}

impl<T: Into<anyhow::Error>> From<T> for WebError {
    fn from(err: T) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, err: err.into() }
    }
}
