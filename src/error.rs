use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_EMAIL_TAKEN, ERR_USERNAME_TAKEN, MSG_AUTH_FAILED};
use crate::forms::FormErrors;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Form validation failed")]
    Validation(FormErrors),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Authentication required")]
    Unauthorized { next: String },

    #[error("Forbidden")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Note not found")]
    NoteNotFound,

    #[error("Notebook not found")]
    NotebookNotFound,
}

impl AppError {
    /// True for the variants that describe a missing row
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::UserNotFound | AppError::NoteNotFound | AppError::NotebookNotFound
        )
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Storage(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Io(ref e) => {
                tracing::error!("I/O error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Session(ref e) => {
                tracing::error!("Session error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::PasswordHash(ref e) => {
                tracing::error!("Password hash error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Multipart(e) => {
                tracing::warn!("Rejected multipart body: {}", e);
                return (e.status(), Json(json!({ "error": e.body_text() }))).into_response();
            }
            AppError::Validation(errors) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "errors": errors })),
                )
                    .into_response();
            }
            AppError::DuplicateUsername => {
                let mut errors = FormErrors::default();
                errors.add("username", ERR_USERNAME_TAKEN);
                return AppError::Validation(errors).into_response();
            }
            AppError::DuplicateEmail => {
                let mut errors = FormErrors::default();
                errors.add("email", ERR_EMAIL_TAKEN);
                return AppError::Validation(errors).into_response();
            }
            AppError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, MSG_AUTH_FAILED),
            AppError::Unauthorized { next } => {
                let location = format!("/login?next={}", urlencoding::encode(&next));
                return Redirect::to(&location).into_response();
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AppError::NoteNotFound => (StatusCode::NOT_FOUND, "Note not found"),
            AppError::NotebookNotFound => (StatusCode::NOT_FOUND, "Notebook not found"),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
