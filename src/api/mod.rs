// REST API for the Sakhi backend

use axum::{Router, http::StatusCode, response::Json, routing::get};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthGate, TokenCodec, UserStore};
use crate::config::AuthSettings;
use crate::db::Db;

mod accounts;
mod community;
mod payload;
mod period;
mod reminders;
mod wellness;

#[cfg(test)]
mod integration_tests;

/// Shared, immutable request context.
pub struct AppContext {
    pub db: Db,
    pub gate: AuthGate,
    pub users: UserStore,
}

pub type AppState = Arc<AppContext>;

impl AppContext {
    pub fn new(db: Db, settings: &AuthSettings) -> AppState {
        Arc::new(Self {
            users: UserStore::new(db.clone()),
            gate: AuthGate::new(TokenCodec::new(settings)),
            db,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        self.gate.codec()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/auth", accounts::router())
        .nest(
            "/api/users",
            accounts::router().merge(accounts::profile_router()),
        )
        .nest("/api/period-tracking", period::router())
        .nest("/api/reminders", reminders::router())
        .nest("/api/health-wellness", wellness::router())
        .nest("/api/community", community::router())
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(serde_json::json!({ "message": "Sakhi Backend API running" }))
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn route_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Route not found" })),
    )
}
