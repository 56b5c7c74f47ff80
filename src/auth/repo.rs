use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::store::{write_error, PgStore, StoreResult};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `StoreError::Duplicate` when the email is taken.
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn update_user_profile(&self, id: Uuid, name: &str, email: &str) -> StoreResult<Option<User>>;
    /// Replaces the password hash and clears any outstanding reset token.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expires_at: OffsetDateTime) -> StoreResult<()>;
    async fn clear_reset_token(&self, id: Uuid) -> StoreResult<()>;
    /// Only returns a user whose token has not expired at `now`.
    async fn find_user_by_reset_token(&self, token_hash: &str, now: OffsetDateTime) -> StoreResult<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, reset_token_hash, reset_token_expires_at, created_at";

#[async_trait]
impl UserRepo for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "User"))
    }

    async fn update_user_profile(&self, id: Uuid, name: &str, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET name = $2, email = $3
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| write_error(e, "User"))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2, reset_token_hash = NULL, reset_token_expires_at = NULL
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expires_at: OffsetDateTime) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn clear_reset_token(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = NULL, reset_token_expires_at = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_user_by_reset_token(&self, token_hash: &str, now: OffsetDateTime) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
             WHERE reset_token_hash = $1 AND reset_token_expires_at > $2
            "#
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }
}
