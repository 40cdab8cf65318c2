//! JSON error envelope returned by every API route.
//!
//! Each failure becomes `{"kind": "...", "message": "..."}` with a matching
//! status. Storage failures are logged and masked as `INTERNAL`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::services::auth::AuthError;
use crate::services::board::BoardError;
use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self { status, kind, message: message.into() }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "login required")
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
    }

    fn internal(err: &StoreError) -> Self {
        tracing::error!(error = %err, "storage failure");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { kind: self.kind, message: &self.message };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::internal(&err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::DuplicatedUser => Self::new(StatusCode::CONFLICT, "DUPLICATED_USER", message),
            AuthError::UserNotFound => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND_USER", message),
            AuthError::WrongPassword => Self::new(StatusCode::UNAUTHORIZED, "WRONG_PASSWORD", message),
            AuthError::InvalidInput(reason) => Self::invalid_input(reason),
            AuthError::Store(e) => Self::internal(&e),
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        let message = err.to_string();
        match err {
            BoardError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND_CONTENTS", message),
            BoardError::Forbidden(_) => Self::forbidden(message),
            BoardError::WriterNotFound(_) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND_USER", message),
            BoardError::InvalidInput(reason) => Self::invalid_input(reason),
            BoardError::Store(e) => Self::internal(&e),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
