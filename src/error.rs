//! API error type and its HTTP rendering.
//!
//! Every failure renders as `{ "message": … }` (plus `errors` for body
//! validation failures). Internal failures are logged and replaced with a
//! generic message.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::{AccessError, AuthError, LoginError, SignupError};

#[derive(Debug)]
pub enum ApiError {
    /// 401: missing or invalid credential
    Auth(AuthError),
    /// 403 / 404 from the ownership policy
    Access(AccessError),
    /// 400: request body failed validation
    InvalidData(Vec<String>),
    /// 400 with a fixed client-facing message
    BadRequest(&'static str),
    /// 500: collaborator failure; detail is logged, never returned
    Internal(String),
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Access(AccessError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Access(_) => StatusCode::FORBIDDEN,
            Self::InvalidData(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::Access(AccessError::NotFound(what))
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Auth(e) => e.to_string(),
            Self::Access(e) => e.to_string(),
            Self::InvalidData(_) => "Invalid data".to_string(),
            Self::BadRequest(msg) => msg.to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "Authentication failed: {}", e),
            Self::Access(e) => write!(f, "Access denied: {}", e),
            Self::InvalidData(errors) => write!(f, "Invalid data: {}", errors.join("; ")),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self::Access(err)
    }
}

impl From<SignupError> for ApiError {
    fn from(err: SignupError) -> Self {
        match err {
            SignupError::EmailInUse => Self::BadRequest("Email already in use"),
            SignupError::Store(e) => e.into(),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => Self::BadRequest("Invalid email or password"),
            LoginError::Store(e) => e.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(detail) = &self {
            tracing::error!("request failed: {}", detail);
        }

        let body = match &self {
            Self::InvalidData(errors) => json!({
                "message": self.public_message(),
                "errors": errors,
            }),
            _ => json!({ "message": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}
