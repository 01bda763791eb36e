//! User storage and account management.

use std::fmt;

use anyhow::Result;
use tracing::{debug, info};

use crate::auth::Role;
use crate::auth::password::{hash_password, verify_password};
use crate::db::Db;
use crate::db::queries::QueryBuilder;
use crate::db::schema::{UserCreate, UserRecord};
use crate::types::UserId;

/// Why a sign-up was refused.
#[derive(Debug)]
pub enum SignupError {
    EmailInUse,
    Store(anyhow::Error),
}

impl fmt::Display for SignupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailInUse => write!(f, "Email already in use"),
            Self::Store(e) => write!(f, "User store error: {}", e),
        }
    }
}

impl std::error::Error for SignupError {}

impl From<anyhow::Error> for SignupError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}

/// Why a login was refused. Unknown email and wrong password are the same
/// variant.
#[derive(Debug)]
pub enum LoginError {
    InvalidCredentials,
    Store(anyhow::Error),
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::Store(e) => write!(f, "User store error: {}", e),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<anyhow::Error> for LoginError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}

/// Emails are compared case-insensitively.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Run CPU-heavy password work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// User store for database operations.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
}

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Register a new account with role USER.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<UserRecord, SignupError> {
        let email = normalize_email(email);
        if QueryBuilder::find_user_by_email(&self.db, &email).await?.is_some() {
            debug!("signup refused: email already registered");
            return Err(SignupError::EmailInUse);
        }

        let password = password.to_string();
        let password_hash = run_blocking(move || hash_password(&password)).await?;

        let create = UserCreate {
            email: email.clone(),
            password_hash,
            name,
            role: Role::User,
        };

        match QueryBuilder::create_user(&self.db, &create).await {
            Ok(user) => {
                info!(user_id = %user.id, "user signed up");
                Ok(user)
            }
            // Lost a race against a concurrent signup; the unique index caught it.
            Err(e) => match QueryBuilder::find_user_by_email(&self.db, &email).await? {
                Some(_) => Err(SignupError::EmailInUse),
                None => Err(SignupError::Store(e)),
            },
        }
    }

    /// Check an email/password pair and return the account.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord, LoginError> {
        let email = normalize_email(email);
        let Some(user) = QueryBuilder::find_user_by_email(&self.db, &email).await? else {
            debug!("login failed: unknown email");
            return Err(LoginError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored = user.password_hash.clone();
        let matches = run_blocking(move || verify_password(&password, &stored)).await?;
        if !matches {
            debug!(user_id = %user.id, "login failed: wrong password");
            return Err(LoginError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        QueryBuilder::find_user_by_id(&self.db, user_id).await
    }

    /// Change the display name. Nothing else about a user is self-service.
    pub async fn update_name(
        &self,
        user_id: &UserId,
        name: Option<String>,
    ) -> Result<Option<UserRecord>> {
        QueryBuilder::update_user_name(&self.db, user_id, name).await
    }

    /// Grant ADMIN to the account with this email. Returns `None` if no
    /// such account exists.
    pub async fn promote(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = normalize_email(email);
        let Some(user) = QueryBuilder::find_user_by_email(&self.db, &email).await? else {
            return Ok(None);
        };

        let promoted = QueryBuilder::set_user_role(&self.db, &user.id, Role::Admin).await?;
        if promoted.is_some() {
            info!(user_id = %user.id, "user promoted to admin");
        }
        Ok(promoted)
    }
}
