//! Self-or-admin access rule shared by every owned resource.
//!
//! Handlers differ only in where the owner id comes from: the path for
//! per-user listings and create-on-behalf-of, the stored record for
//! update and delete.

use std::fmt;

use tracing::debug;

use crate::auth::context::Identity;
use crate::types::UserId;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Access failures raised after authentication succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The target does not exist; checked before ownership.
    NotFound(&'static str),
    /// Not the owner and not an admin.
    Forbidden,
    /// Endpoint is restricted to admins.
    AdminRequired,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{} not found", what),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::AdminRequired => write!(f, "Admin access required"),
        }
    }
}

impl std::error::Error for AccessError {}

/// A persisted record with exactly one owning user.
pub trait Owned {
    fn owner_id(&self) -> &UserId;
}

pub struct OwnershipPolicy;

impl OwnershipPolicy {
    /// ALLOW iff the caller is an admin or owns the resource.
    pub fn authorize(identity: &Identity, owner_id: &UserId) -> Decision {
        if identity.is_admin() || identity.user_id() == owner_id {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// [`OwnershipPolicy::authorize`] as a `Result`.
    pub fn ensure(identity: &Identity, owner_id: &UserId) -> Result<(), AccessError> {
        match Self::authorize(identity, owner_id) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                debug!(
                    caller = %identity.user_id(),
                    owner = %owner_id,
                    "ownership check denied"
                );
                Err(AccessError::Forbidden)
            }
        }
    }

    /// Check a record fetched from the store.
    ///
    /// A missing record is `NotFound` regardless of who is asking; the owner
    /// id is always taken from the stored record.
    pub fn ensure_existing<T: Owned>(
        identity: &Identity,
        record: Option<T>,
        what: &'static str,
    ) -> Result<T, AccessError> {
        let record = record.ok_or(AccessError::NotFound(what))?;
        Self::ensure(identity, record.owner_id())?;
        Ok(record)
    }

    pub fn require_admin(identity: &Identity) -> Result<(), AccessError> {
        if identity.is_admin() {
            Ok(())
        } else {
            debug!(caller = %identity.user_id(), "admin check denied");
            Err(AccessError::AdminRequired)
        }
    }
}
