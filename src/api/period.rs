//! Period logging, history and cycle prediction.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::api::AppState;
use crate::api::payload::{Checks, Payload, Validate, dates};
use crate::auth::{Authenticated, OwnershipPolicy};
use crate::db::QueryBuilder;
use crate::db::schema::{PeriodLogCreate, PeriodLogPatch, PeriodLogRecord};
use crate::error::{ApiError, ApiResult};
use crate::prediction::{Prediction, PredictionOutcome, predict};
use crate::types::UserId;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/log", post(create_log))
        .route("/history/{user_id}", get(history))
        .route("/prediction/{user_id}", get(prediction))
        .route("/{log_id}", put(update_log).delete(delete_log))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLogBody {
    user_id: UserId,
    #[serde(deserialize_with = "dates::date")]
    start_date: NaiveDate,
    #[serde(default, deserialize_with = "dates::opt_date")]
    end_date: Option<NaiveDate>,
    flow_intensity: Option<String>,
    symptoms: Option<String>,
    notes: Option<String>,
}

fn end_not_before_start(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => end >= start,
        _ => true,
    }
}

impl Validate for CreateLogBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .min_len("userId", self.user_id.as_str(), 1)
            .check(
                end_not_before_start(Some(self.start_date), self.end_date),
                "Property 'endDate' must not be before 'startDate'",
            )
            .finish()
    }
}

/// Partial update. A `userId` in the body is ignored; a log never changes
/// owner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLogBody {
    #[serde(default, deserialize_with = "dates::opt_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "dates::opt_date")]
    end_date: Option<NaiveDate>,
    flow_intensity: Option<String>,
    symptoms: Option<String>,
    notes: Option<String>,
}

impl Validate for UpdateLogBody {
    fn validate(&self) -> Vec<String> {
        Checks::new()
            .check(
                end_not_before_start(self.start_date, self.end_date),
                "Property 'endDate' must not be before 'startDate'",
            )
            .finish()
    }
}

impl From<UpdateLogBody> for PeriodLogPatch {
    fn from(body: UpdateLogBody) -> Self {
        Self {
            start_date: body.start_date,
            end_date: body.end_date,
            flow_intensity: body.flow_intensity,
            symptoms: body.symptoms,
            notes: body.notes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PredictionResponse {
    Message { message: &'static str },
    Predicted(Prediction),
}

impl From<PredictionOutcome> for PredictionResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        match outcome {
            PredictionOutcome::InsufficientData => Self::Message {
                message: "Not enough data to predict",
            },
            PredictionOutcome::Predicted(prediction) => Self::Predicted(prediction),
        }
    }
}

async fn create_log(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Payload(body): Payload<CreateLogBody>,
) -> ApiResult<(StatusCode, Json<PeriodLogRecord>)> {
    OwnershipPolicy::ensure(&identity, &body.user_id)?;

    let create = PeriodLogCreate {
        user_id: body.user_id,
        start_date: body.start_date,
        end_date: body.end_date,
        flow_intensity: body.flow_intensity,
        symptoms: body.symptoms,
        notes: body.notes,
    };
    let log = QueryBuilder::create_period_log(&state.db, &create).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn history(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Vec<PeriodLogRecord>>> {
    OwnershipPolicy::ensure(&identity, &user_id)?;
    let logs = QueryBuilder::list_period_logs(&state.db, &user_id).await?;
    Ok(Json(logs))
}

async fn prediction(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<PredictionResponse>> {
    OwnershipPolicy::ensure(&identity, &user_id)?;
    let start_dates = QueryBuilder::list_period_start_dates(&state.db, &user_id).await?;
    Ok(Json(predict(&start_dates).into()))
}

async fn update_log(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(log_id): Path<String>,
    Payload(body): Payload<UpdateLogBody>,
) -> ApiResult<Json<PeriodLogRecord>> {
    let existing = QueryBuilder::find_period_log(&state.db, &log_id).await?;
    let log = OwnershipPolicy::ensure_existing(&identity, existing, "Log")?;

    // The merged record must still end on or after its start.
    let patch = PeriodLogPatch::from(body);
    let start = patch.start_date.unwrap_or(log.start_date);
    if !end_not_before_start(Some(start), patch.end_date.or(log.end_date)) {
        return Err(ApiError::InvalidData(vec![
            "Property 'endDate' must not be before 'startDate'".to_string(),
        ]));
    }

    let updated = QueryBuilder::update_period_log(&state.db, log.id.as_str(), &patch)
        .await?
        .ok_or(ApiError::not_found("Log"))?;
    Ok(Json(updated))
}

async fn delete_log(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(log_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = QueryBuilder::find_period_log(&state.db, &log_id).await?;
    let log = OwnershipPolicy::ensure_existing(&identity, existing, "Log")?;

    QueryBuilder::delete_period_log(&state.db, log.id.as_str()).await?;
    info!(log_id = %log.id, caller = %identity.user_id(), "period log deleted");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
