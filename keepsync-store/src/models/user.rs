//! User identity types
//!
//! Users are created by the registration flow upstream; this crate only
//! stores and resolves them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationError;

/// Maximum length for usernames
const MAX_USERNAME_LEN: usize = 128;

/// Database id of a user (`users.id`, SERIAL)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    /// Reject the zero id before it is used to address records.
    pub fn require_set(self) -> Result<Self, ValidationError> {
        if self.0 == 0 {
            return Err(ValidationError::ZeroUserId);
        }
        Ok(self)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username.
    ///
    /// # Rules
    /// - Not empty or whitespace-only
    /// - Max 128 characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if s.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// User row from the `users` table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_user_id_rejected() {
        assert_eq!(
            UserId::new(0).require_set().unwrap_err(),
            ValidationError::ZeroUserId
        );
        assert_eq!(UserId::new(7).require_set().unwrap(), UserId::new(7));
    }

    #[test]
    fn username_rules() {
        assert!(Username::new("alice").is_ok());
        assert!(matches!(
            Username::new("   ").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(matches!(
            Username::new(&"a".repeat(129)).unwrap_err(),
            ValidationError::TooLong { max: 128, .. }
        ));
        assert!(Username::new(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn password_hash_not_serialized() {
        let user = User {
            id: UserId::new(1),
            username: "alice".into(),
            password_hash: "h1".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json.get("password_hash").is_none());
    }
}
