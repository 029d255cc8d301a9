//! User repository
//!
//! Thin lookups used to resolve record ownership. "Not found" is an error
//! only for the getters; `user_exists` answers it as `false`.

use sqlx::PgPool;

use crate::context::OpContext;
use crate::error::{KeeperError, Result};
use crate::models::{User, UserId, Username, ValidationError};

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// True iff a user with this username exists.
    pub async fn user_exists(&self, ctx: &OpContext, username: &str) -> Result<bool> {
        const OP: &str = "user exists";

        ctx.run(OP, async {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool)
                .await
                .map_err(|e| KeeperError::from_sqlx(OP, e))
        })
        .await
    }

    /// Register a user, returning the new id.
    ///
    /// A duplicate username fails with `ConstraintViolation` and leaves the
    /// existing row untouched.
    pub async fn add_user(
        &self,
        ctx: &OpContext,
        username: &str,
        password_hash: &str,
    ) -> Result<UserId> {
        const OP: &str = "add user";

        let username = Username::new(username)?;
        if password_hash.is_empty() {
            return Err(ValidationError::Empty {
                field: "password hash",
            }
            .into());
        }

        let id = ctx
            .run(OP, async {
                sqlx::query_scalar::<_, UserId>(
                    "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
                )
                .bind(username.as_str())
                .bind(password_hash)
                .fetch_one(self.pool)
                .await
                .map_err(|e| KeeperError::from_sqlx(OP, e))
            })
            .await?;

        tracing::info!(user_id = %id, username = username.as_str(), "user added");
        Ok(id)
    }

    /// Resolve a username to its id.
    pub async fn get_user_id(&self, ctx: &OpContext, username: &str) -> Result<UserId> {
        const OP: &str = "get user id";

        ctx.run(OP, async {
            sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| KeeperError::from_sqlx(OP, e))
        })
        .await?
        .ok_or_else(|| KeeperError::not_found("user", username))
    }

    /// Stored password hash for a username.
    pub async fn get_password_hash(&self, ctx: &OpContext, username: &str) -> Result<String> {
        const OP: &str = "get password hash";

        ctx.run(OP, async {
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| KeeperError::from_sqlx(OP, e))
        })
        .await?
        .ok_or_else(|| KeeperError::not_found("user", username))
    }

    /// Full user row.
    pub async fn get_user(&self, ctx: &OpContext, username: &str) -> Result<User> {
        const OP: &str = "get user";

        ctx.run(OP, async {
            sqlx::query_as::<_, User>(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
            )
            .bind(username)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KeeperError::from_sqlx(OP, e))
        })
        .await?
        .ok_or_else(|| KeeperError::not_found("user", username))
    }
}
