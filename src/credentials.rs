use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{hash_password, verify_password};

/// Create an account with a freshly salted password hash
///
/// Fails with `DuplicateUsername` / `DuplicateEmail` when either is taken,
/// including when a concurrent registration wins the race to insert.
pub async fn register(db: &Db, username: &str, email: &str, password: &str) -> Result<User> {
    if db.username_exists(username).await? {
        return Err(AppError::DuplicateUsername);
    }
    if db.email_exists(email).await? {
        return Err(AppError::DuplicateEmail);
    }

    // Argon2 is deliberately slow; keep it off the async workers
    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await?
        .map_err(AppError::PasswordHash)?;

    let user = db.create_user(username, email, &password_hash).await?;

    tracing::info!("New user registered: {}", user.id);
    Ok(user)
}

/// Check an email/password pair
///
/// An unknown email and a wrong password both yield `AuthenticationFailed`.
pub async fn verify(db: &Db, email: &str, password: &str) -> Result<User> {
    let Some(user) = db.find_user_by_email(email).await? else {
        tracing::warn!("Login attempt failed");
        return Err(AppError::AuthenticationFailed);
    };

    let password = password.to_string();
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await?
        .map_err(AppError::PasswordHash)?;

    if !matches {
        tracing::warn!("Login attempt failed");
        return Err(AppError::AuthenticationFailed);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_verify() {
        let db = Db::open_in_memory().await.unwrap();
        let user = register(&db, "alice", "alice@example.com", "pw123")
            .await
            .unwrap();

        assert_ne!(user.password_hash, "pw123");

        let verified = verify(&db, "alice@example.com", "pw123").await.unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn test_verify_failures_are_indistinguishable() {
        let db = Db::open_in_memory().await.unwrap();
        register(&db, "alice", "alice@example.com", "pw123")
            .await
            .unwrap();

        let wrong_password = verify(&db, "alice@example.com", "nope").await;
        let unknown_email = verify(&db, "nobody@example.com", "pw123").await;

        assert!(matches!(wrong_password, Err(AppError::AuthenticationFailed)));
        assert!(matches!(unknown_email, Err(AppError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let db = Db::open_in_memory().await.unwrap();
        register(&db, "alice", "alice@example.com", "pw123")
            .await
            .unwrap();

        assert!(matches!(
            register(&db, "alice", "new@example.com", "pw").await,
            Err(AppError::DuplicateUsername)
        ));
        assert!(matches!(
            register(&db, "alice2", "alice@example.com", "pw").await,
            Err(AppError::DuplicateEmail)
        ));
    }
}
