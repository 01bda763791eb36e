//! Signed, time-limited credentials.
//!
//! A credential is an HS256 JWT whose payload restates the caller's
//! [`Identity`] plus issued-at and expiry timestamps:
//!
//! ```json
//! { "userId": "…", "role": "USER", "iat": 1704067200, "exp": 1704672000 }
//! ```
//!
//! Verification failures all collapse into [`AuthError::InvalidCredential`];
//! the concrete reason is only logged at debug level.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::context::{Identity, Role};
use crate::auth::extractor::AuthError;
use crate::config::AuthSettings;
use crate::types::UserId;

/// Decoded credential payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialClaims {
    pub user_id: String,
    pub role: Role,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// Signs and verifies credentials with the process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Self {
        let secret = settings.jwt_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            default_ttl: settings.token_ttl(),
        }
    }

    /// Lifetime applied by [`TokenCodec::issue_default`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a credential for `identity` valid for the configured TTL.
    pub fn issue_default(&self, identity: &Identity) -> Result<String> {
        self.issue(identity, self.default_ttl)
    }

    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String> {
        self.issue_at(identity, ttl, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = CredentialClaims {
            user_id: identity.user_id().to_string(),
            role: identity.role(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to sign credential")
    }

    pub fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        self.verify_at(credential, Utc::now())
    }

    /// Verify `credential` as of `now`.
    ///
    /// A credential is valid while `now < exp`.
    pub fn verify_at(&self, credential: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let data = decode::<CredentialClaims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("credential rejected: {}", e);
                AuthError::InvalidCredential
            })?;

        let claims = data.claims;
        if now.timestamp() >= claims.exp {
            debug!("credential rejected: expired at {}", claims.exp);
            return Err(AuthError::InvalidCredential);
        }
        if claims.user_id.is_empty() {
            debug!("credential rejected: empty subject");
            return Err(AuthError::InvalidCredential);
        }

        Ok(Identity::new(UserId::new(claims.user_id), claims.role))
    }
}
