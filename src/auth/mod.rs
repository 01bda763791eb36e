//! Authentication and authorization.
//!
//! Every protected request goes through the same three steps:
//!
//! - **Gate**: the bearer credential in `Authorization` is verified by the
//!   [`TokenCodec`] and turned into an [`Identity`], or the request is
//!   rejected with 401
//! - **Load**: the handler fetches the target record from the store
//! - **Policy**: [`OwnershipPolicy`] allows the owner or an admin; a missing
//!   record is 404 before ownership is considered
//!
//! ## Usage
//!
//! ```ignore
//! async fn delete_log(
//!     State(state): State<AppState>,
//!     Authenticated(identity): Authenticated,
//!     Path(log_id): Path<String>,
//! ) -> ApiResult<Json<Value>> {
//!     let existing = QueryBuilder::find_period_log(&state.db, &log_id).await?;
//!     let log = OwnershipPolicy::ensure_existing(&identity, existing, "Log")?;
//!     // ...
//! }
//! ```

mod context;
mod extractor;
pub mod password;
mod policy;
mod token;
mod user_store;

pub use context::{Identity, Role};
pub use extractor::{AuthError, AuthGate, Authenticated};
pub use policy::{AccessError, Decision, Owned, OwnershipPolicy};
pub use token::TokenCodec;
pub use user_store::{LoginError, SignupError, UserStore};
