//! Authentication gate for HTTP requests.

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::api::AppState;
use crate::auth::context::Identity;
use crate::auth::token::TokenCodec;
use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication errors.
///
/// Both variants map to 401. Neither carries detail about why a credential
/// was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or not a bearer credential
    MissingCredential,
    /// Bad signature, malformed payload or expired
    InvalidCredential,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "Missing or invalid Authorization header"),
            Self::InvalidCredential => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Turns an `Authorization` header into an [`Identity`].
///
/// Never touches the store.
#[derive(Clone)]
pub struct AuthGate {
    codec: TokenCodec,
}

impl AuthGate {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate a raw `Authorization` header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let token = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        self.codec.verify(token)
    }

    /// Authenticate from request parts, reusing an identity already bound
    /// to this request.
    pub fn authenticate_parts(&self, parts: &mut Parts) -> Result<Identity, AuthError> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }

        // A header that is not valid visible ASCII is treated as absent.
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let identity = self.authenticate(header).inspect_err(|e| {
            debug!(path = %parts.uri.path(), "request rejected: {}", e);
        })?;

        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

/// Extractor for handlers that require a verified caller.
///
/// Public handlers simply do not take this argument, so an unset identity
/// can never be read.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = state.gate.authenticate_parts(parts)?;
        Ok(Self(identity))
    }
}
