//! Health and wellness content: public reading, admin publishing.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::payload::{Checks, Payload, Validate};
use crate::auth::{Authenticated, OwnershipPolicy};
use crate::db::QueryBuilder;
use crate::db::schema::{
    ArticleCreate, ArticleRecord, ResourceCreate, ResourceRecord, TipCreate, TipRecord,
};
use crate::error::{ApiError, ApiResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route("/articles/{article_id}", get(get_article))
        .route("/tips", get(list_tips).post(create_tip))
        .route("/resources", get(list_resources).post(create_resource))
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleBody {
    title: String,
    content: String,
    category: Option<String>,
    #[serde(default = "default_published")]
    is_published: bool,
}

impl Validate for ArticleBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .min_len("title", &self.title, 3)
            .min_len("content", &self.content, 10)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TipBody {
    content: String,
    category: Option<String>,
}

impl Validate for TipBody {
    fn validate(&self) -> Vec<String> {
        Checks::new().min_len("content", &self.content, 1).finish()
    }
}

#[derive(Debug, Deserialize)]
struct ResourceBody {
    title: String,
    url: String,
    description: Option<String>,
}

impl Validate for ResourceBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .min_len("title", &self.title, 1)
            .uri("url", &self.url)
            .finish()
    }
}

async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<ArticleRecord>>> {
    Ok(Json(QueryBuilder::list_published_articles(&state.db).await?))
}

/// Drafts are indistinguishable from missing articles.
async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> ApiResult<Json<ArticleRecord>> {
    QueryBuilder::find_article(&state.db, &article_id)
        .await?
        .filter(|article| article.is_published)
        .map(Json)
        .ok_or(ApiError::not_found("Article"))
}

async fn create_article(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<ArticleBody>,
) -> ApiResult<(StatusCode, Json<ArticleRecord>)> {
    OwnershipPolicy::require_admin(&identity)?;

    let create = ArticleCreate {
        title: body.title,
        content: body.content,
        category: body.category,
        is_published: body.is_published,
    };
    let article = QueryBuilder::create_article(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn list_tips(State(state): State<AppState>) -> ApiResult<Json<Vec<TipRecord>>> {
    Ok(Json(QueryBuilder::list_tips(&state.db).await?))
}

async fn create_tip(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<TipBody>,
) -> ApiResult<(StatusCode, Json<TipRecord>)> {
    OwnershipPolicy::require_admin(&identity)?;

    let create = TipCreate {
        content: body.content,
        category: body.category,
    };
    let tip = QueryBuilder::create_tip(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(tip)))
}

async fn list_resources(State(state): State<AppState>) -> ApiResult<Json<Vec<ResourceRecord>>> {
    Ok(Json(QueryBuilder::list_resources(&state.db).await?))
}

async fn create_resource(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<ResourceBody>,
) -> ApiResult<(StatusCode, Json<ResourceRecord>)> {
    OwnershipPolicy::require_admin(&identity)?;

    let create = ResourceCreate {
        title: body.title,
        url: body.url,
        description: body.description,
    };
    let resource = QueryBuilder::create_resource(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}
