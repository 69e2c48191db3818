use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::{json, Value};

use crate::constants::MSG_DELETE_NOTE_FAILED;
use crate::db::{Db, NoteUpdate};
use crate::error::Result;
use crate::forms::{FormFields, NoteForm, TitleForm};
use crate::routes::{ensure_self, render};
use crate::session::RequireUser;
use crate::AppState;

/// GET /notes
pub async fn list_notes(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
) -> Result<Json<Value>> {
    let notes = state.db.note_views(user.id).await?;
    render(&session, "notes", json!({ "user": user, "notes": notes })).await
}

/// GET /user/{id}/new_note
pub async fn new_note_form(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ensure_self(&user, id)?;

    let choices = state.db.list_notebooks(user.id).await?;
    render(
        &session,
        "new_note",
        json!({
            "fields": ["title", "description", "notebooks"],
            "choices": { "notebooks": choices },
        }),
    )
    .await
}

/// POST /user/{id}/new_note
pub async fn create_note(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
    Form(fields): Form<FormFields>,
) -> Result<Redirect> {
    ensure_self(&user, id)?;

    let form = NoteForm::from_fields(&fields);
    let notebook_ids = form.validate(&state.db, user.id).await?;

    state
        .db
        .create_note(user.id, &form.title, &form.description, &notebook_ids)
        .await?;

    Ok(Redirect::to("/notes"))
}

/// GET /update_note/{id}
pub async fn update_note_form(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let note = state.db.get_owned_note(id, user.id).await?;
    render(&session, "update_note", json!({ "user": user, "note": note })).await
}

/// POST /update_note/{id}
///
/// Only the title is editable.
pub async fn update_note(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
    Form(fields): Form<FormFields>,
) -> Result<Redirect> {
    let form = TitleForm::from_fields(&fields);
    form.validate()?;

    let note = state.db.get_owned_note(id, user.id).await?;
    let changes = NoteUpdate {
        title: Some(form.title),
        description: None,
    };
    state.db.update_note(note.id, changes).await?;

    Ok(Redirect::to("/notes"))
}

async fn delete_owned_note(db: &Db, id: i64, owner: i64) -> Result<()> {
    let note = db.get_owned_note(id, owner).await?;
    db.delete_note(note.id).await
}

/// GET|POST /delete_note/{id}
///
/// Failures answer with a plain-text message instead of the usual error body.
pub async fn delete_note(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
) -> Response {
    match delete_owned_note(&state.db, id, user.id).await {
        Ok(()) => Redirect::to("/notes").into_response(),
        Err(e) if e.is_not_found() => {
            tracing::warn!("Note {} not deleted: {}", id, e);
            (StatusCode::NOT_FOUND, MSG_DELETE_NOTE_FAILED).into_response()
        }
        Err(e) => {
            tracing::error!("Note {} not deleted: {:?}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_DELETE_NOTE_FAILED).into_response()
        }
    }
}

/// GET|POST /details/{id}
pub async fn note_details(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let note = state.db.get_owned_note(id, user.id).await?;
    let note = state.db.note_view(note).await?;
    render(&session, "details", json!({ "user": user, "note": note })).await
}
