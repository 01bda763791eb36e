//! Community posts and comments.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::AppState;
use crate::api::payload::{Checks, Payload, Validate};
use crate::auth::{Authenticated, OwnershipPolicy};
use crate::db::QueryBuilder;
use crate::db::schema::{
    CommentCreate, CommentRecord, CommunityPostCreate, CommunityPostRecord, PostWithComments,
};
use crate::error::{ApiError, ApiResult};
use crate::types::RecordKey;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{post_id}", get(get_post).delete(delete_post))
        .route("/comments", post(create_comment))
}

#[derive(Debug, Deserialize)]
struct PostBody {
    title: String,
    content: String,
    category: Option<String>,
}

impl Validate for PostBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .min_len("title", &self.title, 3)
            .min_len("content", &self.content, 10)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody {
    post_id: RecordKey,
    content: String,
}

impl Validate for CommentBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .min_len("postId", self.post_id.as_str(), 1)
            .min_len("content", &self.content, 1)
            .finish()
    }
}

/// The author is always the caller.
async fn create_post(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<PostBody>,
) -> ApiResult<(StatusCode, Json<CommunityPostRecord>)> {
    let create = CommunityPostCreate {
        user_id: identity.user_id().clone(),
        title: body.title,
        content: body.content,
        category: body.category,
    };
    let post = QueryBuilder::create_post(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<PostWithComments>>> {
    Ok(Json(QueryBuilder::list_posts_with_comments(&state.db).await?))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<PostWithComments>> {
    QueryBuilder::find_post_with_comments(&state.db, &post_id)
        .await?
        .map(Json)
        .ok_or(ApiError::not_found("Post"))
}

async fn create_comment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<CommentBody>,
) -> ApiResult<(StatusCode, Json<CommentRecord>)> {
    let post = QueryBuilder::find_post(&state.db, body.post_id.as_str())
        .await?
        .ok_or(ApiError::not_found("Post"))?;

    let create = CommentCreate {
        post_id: post.id,
        user_id: identity.user_id().clone(),
        content: body.content,
    };
    let comment = QueryBuilder::create_comment(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_post(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = QueryBuilder::find_post(&state.db, &post_id).await?;
    let post = OwnershipPolicy::ensure_existing(&identity, existing, "Post")?;

    QueryBuilder::delete_post(&state.db, post.id.as_str()).await?;
    info!(post_id = %post.id, caller = %identity.user_id(), "community post deleted");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
