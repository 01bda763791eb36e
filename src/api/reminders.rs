//! Reminder endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::AppState;
use crate::api::payload::{Checks, Payload, Validate, dates};
use crate::auth::{Authenticated, OwnershipPolicy};
use crate::db::QueryBuilder;
use crate::db::schema::{ReminderCreate, ReminderPatch, ReminderRecord, ReminderType};
use crate::error::{ApiError, ApiResult};
use crate::types::UserId;

const MIN_TITLE_LEN: usize = 3;

pub fn router() -> Router<AppState> {
    // `{id}` is the owner on GET and the reminder on PUT/DELETE.
    Router::new()
        .route("/", post(create_reminder))
        .route(
            "/{id}",
            get(list_reminders).put(update_reminder).delete(delete_reminder),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReminderBody {
    user_id: UserId,
    #[serde(rename = "type")]
    reminder_type: ReminderType,
    title: String,
    description: Option<String>,
    #[serde(deserialize_with = "dates::datetime")]
    remind_at: DateTime<Utc>,
}

impl Validate for CreateReminderBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .min_len("userId", self.user_id.as_str(), 1)
            .min_len("title", &self.title, MIN_TITLE_LEN)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReminderBody {
    #[serde(rename = "type")]
    reminder_type: Option<ReminderType>,
    title: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "dates::opt_datetime")]
    remind_at: Option<DateTime<Utc>>,
}

impl Validate for UpdateReminderBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .opt_min_len("title", self.title.as_deref(), MIN_TITLE_LEN)
            .finish()
    }
}

impl From<UpdateReminderBody> for ReminderPatch {
    fn from(body: UpdateReminderBody) -> Self {
        Self {
            reminder_type: body.reminder_type,
            title: body.title,
            description: body.description,
            remind_at: body.remind_at,
        }
    }
}

async fn create_reminder(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<CreateReminderBody>,
) -> ApiResult<(StatusCode, Json<ReminderRecord>)> {
    OwnershipPolicy::ensure(&identity, &body.user_id)?;

    let create = ReminderCreate {
        user_id: body.user_id,
        reminder_type: body.reminder_type,
        title: body.title,
        description: body.description,
        remind_at: body.remind_at,
    };
    let reminder = QueryBuilder::create_reminder(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn list_reminders(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Vec<ReminderRecord>>> {
    OwnershipPolicy::ensure(&identity, &user_id)?;
    let reminders = QueryBuilder::list_reminders(&state.db, &user_id).await?;
    Ok(Json(reminders))
}

async fn update_reminder(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(reminder_id): Path<String>,
    Payload(body): Payload<UpdateReminderBody>,
) -> ApiResult<Json<ReminderRecord>> {
    let existing = QueryBuilder::find_reminder(&state.db, &reminder_id).await?;
    let reminder = OwnershipPolicy::ensure_existing(&identity, existing, "Reminder")?;

    let updated = QueryBuilder::update_reminder(&state.db, reminder.id.as_str(), &body.into())
        .await?
        .ok_or(ApiError::not_found("Reminder"))?;
    Ok(Json(updated))
}

async fn delete_reminder(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(reminder_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = QueryBuilder::find_reminder(&state.db, &reminder_id).await?;
    let reminder = OwnershipPolicy::ensure_existing(&identity, existing, "Reminder")?;

    QueryBuilder::delete_reminder(&state.db, reminder.id.as_str()).await?;
    info!(reminder_id = %reminder.id, caller = %identity.user_id(), "reminder deleted");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
