use chrono::Utc;

use super::Db;
use crate::error::{AppError, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

/// Translate a UNIQUE violation on the user table into the matching domain error
fn map_user_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("user.username") {
                return AppError::DuplicateUsername;
            }
            if message.contains("user.email") {
                return AppError::DuplicateEmail;
            }
        }
    }
    AppError::Storage(err)
}

impl Db {
    /// Insert a new user; the password must already be hashed
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO user (username, email, password_hash, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_user_conflict)?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.find_user(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Change username and email, keeping both globally unique
    pub async fn update_user(&self, id: i64, username: &str, email: &str) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE user SET username = ?, email = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_user_conflict)?
        .ok_or(AppError::UserNotFound)?;

        tx.commit().await?;

        Ok(user)
    }

    /// Delete a user together with everything they own
    ///
    /// Notes go first, then notebooks, then the user row, all in one
    /// transaction. Association rows follow their note/notebook through
    /// `ON DELETE CASCADE`. Every statement is a write, so the transaction
    /// holds the write lock from its first statement on.
    pub async fn delete_user_cascade(&self, user_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let notes = sqlx::query("DELETE FROM notes WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let notebooks = sqlx::query("DELETE FROM notebook WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let users = sqlx::query("DELETE FROM user WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if users == 0 {
            // Dropping the transaction rolls it back
            return Err(AppError::UserNotFound);
        }

        tx.commit().await?;

        tracing::info!(
            "User {} deleted with {} notes and {} notebooks",
            user_id,
            notes,
            notebooks
        );

        Ok(())
    }
}
