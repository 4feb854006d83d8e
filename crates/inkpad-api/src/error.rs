use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error, warn};

use inkpad_db::StoreError;
use inkpad_types::api::ErrorResponse;

use crate::password::PasswordError;
use crate::token::TokenError;

pub const TOKEN_REQUIRED: &str = "token required";
pub const INVALID_TOKEN: &str = "invalid token";
pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const INVALID_OLD_PASSWORD: &str = "invalid old password";
pub const ALREADY_TAKEN: &str = "username or email already taken";
pub const USER_NOT_FOUND: &str = "user not found";
pub const NOTE_NOT_FOUND: &str = "note not found";

/// Every failure that can leave an HTTP handler. Messages are fixed for the
/// auth and not-found cases so responses never reveal which check failed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Auth(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(column) => {
                warn!("Unique constraint rejected write on {}", column);
                Self::Conflict(ALREADY_TAKEN)
            }
            other => {
                error!("Store failure: {}", other);
                Self::Internal
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        error!("Password hashing failure: {}", err);
        Self::Internal
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        error!("Token signing failure: {}", err);
        Self::Internal
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        Self::validation("invalid input")
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", err);
        Self::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_409() {
        let err: ApiError = StoreError::Conflict("email".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), ALREADY_TAKEN);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err: ApiError = StoreError::Poisoned.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
    }
}
