//! NewType wrappers for identifiers that flow through the API.
//!
//! Owner ids and record keys are both strings on the wire; keeping them
//! distinct here stops a record key from being compared against an owner id
//! by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

newtype_string!(
    /// Identifier of a user account.
    ///
    /// This is the bare record key of the `user` table and is what every
    /// owned record stores in its `userId` field.
    UserId
);

newtype_string!(
    /// Bare record key of a non-user record (log, reminder, post, ...).
    RecordKey
);

impl UserId {
    /// Generate a fresh user id.
    pub fn generate() -> Self {
        Self(new_key())
    }
}

impl RecordKey {
    /// Generate a fresh record key.
    pub fn generate() -> Self {
        Self(new_key())
    }
}

/// Record keys are simple (hyphen-free) v4 UUIDs so they never need escaping
/// inside a SurrealDB record id.
fn new_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
