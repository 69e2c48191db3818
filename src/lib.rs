//! Notes App Server Library
//!
//! This module exports the core types and the router for testing and reuse.

pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod routes;
pub mod security;
pub mod session;
pub mod uploads;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer};

use constants::{MAX_CONTENT_LENGTH, UPLOAD_URL_PREFIX};
use security::session_key;
use uploads::UploadStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub uploads: UploadStore,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        let uploads = UploadStore::new(&config.upload_dir);
        Self {
            db,
            config,
            uploads,
        }
    }
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    use routes::*;

    let session_layer = SessionManagerLayer::new(session::session_store(&state.db))
        .with_secure(state.config.is_production())
        .with_expiry(Expiry::OnSessionEnd)
        .with_signed(session_key(&state.config.secret_key));

    let static_uploads = ServeDir::new(state.uploads.dir());

    Router::new()
        .route("/health", get(health_check))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/", get(index).post(upload_image))
        .route("/upload_form", get(upload_form))
        .route("/display/{filename}", get(display_image))
        .route("/notes", get(list_notes))
        .route("/notebooks", get(list_notebooks))
        .route("/user/{id}/new_note", get(new_note_form).post(create_note))
        .route(
            "/user/{id}/new_notebook",
            get(new_notebook_form).post(create_notebook),
        )
        .route("/update_note/{id}", get(update_note_form).post(update_note))
        .route("/update/{id}", get(update_notebook_form).post(update_notebook))
        .route("/delete_note/{id}", get(delete_note).post(delete_note))
        .route("/delete/{id}", get(delete_notebook).post(delete_notebook))
        .route("/details/{id}", get(note_details).post(note_details))
        .route("/deleteAcc/{id}", get(delete_account).post(delete_account))
        .nest_service(UPLOAD_URL_PREFIX, static_uploads)
        .layer(session_layer)
        .layer(DefaultBodyLimit::max(MAX_CONTENT_LENGTH))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
