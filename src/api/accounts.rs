//! Sign-up, login and profile endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::api::payload::{Checks, Payload, Validate};
use crate::auth::{Authenticated, Identity, OwnershipPolicy};
use crate::db::schema::{UserProfile, UserRecord};
use crate::error::{ApiError, ApiResult};
use crate::types::UserId;

const MIN_PASSWORD_LEN: usize = 6;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn profile_router() -> Router<AppState> {
    Router::new().route("/profile/{user_id}", get(get_profile).put(update_profile))
}

#[derive(Debug, Deserialize)]
struct SignupBody {
    email: String,
    password: String,
    name: Option<String>,
}

impl Validate for SignupBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .email("email", &self.email)
            .check(
                self.password.chars().count() >= MIN_PASSWORD_LEN,
                "Property 'password' must be at least 6 characters",
            )
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

impl Validate for LoginBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .email("email", &self.email)
            .check(!self.password.is_empty(), "Property 'password' is required")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ProfileUpdateBody {
    name: Option<String>,
}

impl Validate for ProfileUpdateBody {
    fn validate(&self) -> Vec<String> {
        Checks::new().opt_min_len("name", self.name.as_deref(), 1).finish()
    }
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserProfile,
}

fn issue_for(state: &AppState, user: UserRecord) -> ApiResult<AuthResponse> {
    let identity = Identity::new(user.id.clone(), user.role);
    let token = state.codec().issue_default(&identity)?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

async fn signup(
    State(state): State<AppState>,
    Payload(body): Payload<SignupBody>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let user = state
        .users
        .signup(&body.email, &body.password, body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(issue_for(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<LoginBody>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state.users.login(&body.email, &body.password).await?;
    Ok(Json(issue_for(&state, user)?))
}

async fn get_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<UserProfile>> {
    // The path names the owner, so the policy needs no lookup.
    OwnershipPolicy::ensure(&identity, &user_id)?;

    let user = state
        .users
        .get_user(&user_id)
        .await?
        .ok_or(ApiError::not_found("User"))?;
    Ok(Json(user.into()))
}

async fn update_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<UserId>,
    Payload(body): Payload<ProfileUpdateBody>,
) -> ApiResult<Json<UserProfile>> {
    let existing = state.users.get_user(&user_id).await?;
    let user = OwnershipPolicy::ensure_existing(&identity, existing, "User")?;

    let updated = state
        .users
        .update_name(&user.id, body.name)
        .await?
        .ok_or(ApiError::not_found("User"))?;
    Ok(Json(updated.into()))
}
