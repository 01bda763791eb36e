use anyhow::{Result, bail};
use std::time::Duration;

/// Default credential lifetime: seven days.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Settings for credential issuance and verification.
///
/// Built once at startup and handed to [`crate::auth::TokenCodec`]; nothing
/// downstream reads the secret from the environment.
#[derive(Clone)]
pub struct AuthSettings {
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>, token_ttl: Duration) -> Result<Self> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.trim().is_empty() {
            bail!("JWT secret must not be empty");
        }
        if token_ttl.is_zero() {
            bail!("token TTL must be greater than zero");
        }
        Ok(Self {
            jwt_secret,
            token_ttl,
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}
