use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::{json, Value};

use crate::constants::MSG_DELETE_NOTEBOOK_FAILED;
use crate::db::Db;
use crate::error::Result;
use crate::forms::{FormFields, NotebookForm, TitleForm};
use crate::routes::{ensure_self, render};
use crate::session::RequireUser;
use crate::AppState;

/// GET /notebooks
pub async fn list_notebooks(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
) -> Result<Json<Value>> {
    let notebooks = state.db.notebook_views(user.id).await?;
    render(
        &session,
        "notebooks",
        json!({ "user": user, "notebooks": notebooks }),
    )
    .await
}

/// GET /user/{id}/new_notebook
pub async fn new_notebook_form(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ensure_self(&user, id)?;

    let choices = state.db.list_notes(user.id).await?;
    render(
        &session,
        "new_notebook",
        json!({
            "fields": ["title", "notes"],
            "choices": { "notes": choices },
        }),
    )
    .await
}

/// POST /user/{id}/new_notebook
pub async fn create_notebook(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
    Form(fields): Form<FormFields>,
) -> Result<Redirect> {
    ensure_self(&user, id)?;

    let form = NotebookForm::from_fields(&fields);
    let note_ids = form.validate(&state.db, user.id).await?;

    state
        .db
        .create_notebook(user.id, &form.title, &note_ids)
        .await?;

    Ok(Redirect::to("/notebooks"))
}

/// GET /update/{id}
pub async fn update_notebook_form(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let notebook = state.db.get_owned_notebook(id, user.id).await?;
    render(
        &session,
        "update_notebook",
        json!({ "user": user, "notebook": notebook }),
    )
    .await
}

/// POST /update/{id}
pub async fn update_notebook(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
    Form(fields): Form<FormFields>,
) -> Result<Redirect> {
    let form = TitleForm::from_fields(&fields);
    form.validate()?;

    let notebook = state.db.get_owned_notebook(id, user.id).await?;
    state
        .db
        .update_notebook_title(notebook.id, &form.title)
        .await?;

    Ok(Redirect::to("/notebooks"))
}

async fn delete_owned_notebook(db: &Db, id: i64, owner: i64) -> Result<()> {
    let notebook = db.get_owned_notebook(id, owner).await?;
    db.delete_notebook(notebook.id).await
}

/// GET|POST /delete/{id}
///
/// Deletes the notebook only; its notes stay.
pub async fn delete_notebook(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
) -> Response {
    match delete_owned_notebook(&state.db, id, user.id).await {
        Ok(()) => Redirect::to("/notebooks").into_response(),
        Err(e) if e.is_not_found() => {
            tracing::warn!("Notebook {} not deleted: {}", id, e);
            (StatusCode::NOT_FOUND, MSG_DELETE_NOTEBOOK_FAILED).into_response()
        }
        Err(e) => {
            tracing::error!("Notebook {} not deleted: {:?}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_DELETE_NOTEBOOK_FAILED).into_response()
        }
    }
}
