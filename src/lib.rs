// Core modules
pub mod api;
pub mod auth;
mod config;
pub mod db;
mod error;
pub mod prediction;
mod types;

// Re-export key types and functions
pub use api::{AppContext, AppState, create_router};
pub use auth::{AuthGate, Identity, OwnershipPolicy, Role, TokenCodec, UserStore};
pub use config::{AuthSettings, DEFAULT_TOKEN_TTL};
pub use db::{DatabaseConfig, Db, create_connection, ensure_schema};
pub use error::{ApiError, ApiResult};
pub use prediction::{Prediction, PredictionOutcome, predict};
pub use types::{RecordKey, UserId};
