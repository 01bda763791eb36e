//! Request-scoped identity.

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. ADMIN bypasses every ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity decoded from a verified credential.
///
/// Lives for one request. The user id and role are taken from the signed
/// payload as-is; the store is not consulted again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    user_id: UserId,
    role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Convenience constructor for a regular user.
    pub fn user(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id.into(), Role::User)
    }

    /// Convenience constructor for an administrator.
    pub fn admin(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id.into(), Role::Admin)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
