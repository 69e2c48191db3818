use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{json, Value};

use crate::constants::{
    ALLOWED_EXTENSIONS, MAX_CONTENT_LENGTH, MSG_ALLOWED_IMAGE_TYPES, MSG_NO_FILE_PART,
    UPLOAD_FIELD, UPLOAD_URL_PREFIX,
};
use crate::error::Result;
use crate::routes::render;
use crate::security::sanitize_filename;
use crate::session::CurrentUser;
use crate::uploads::{accept_batch, IncomingFile};
use crate::AppState;

/// GET /upload_form
pub async fn upload_form(current: CurrentUser) -> Result<Json<Value>> {
    render(
        &current.session,
        "upload_form",
        json!({
            "field": UPLOAD_FIELD,
            "allowed_extensions": ALLOWED_EXTENSIONS,
            "max_content_length": MAX_CONTENT_LENGTH,
        }),
    )
    .await
}

/// POST /
///
/// Stores every file of the `files[]` field, or none of them if any name is
/// not an allowed image.
pub async fn upload_image(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut files = Vec::new();
    let mut saw_field = false;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        saw_field = true;

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        files.push(IncomingFile { filename, data });
    }

    if !saw_field {
        current.session.flash("info", MSG_NO_FILE_PART).await?;
        return Ok(Redirect::to("/").into_response());
    }

    let Some(accepted) = accept_batch(files) else {
        current.session.flash("danger", MSG_ALLOWED_IMAGE_TYPES).await?;
        return Ok(Redirect::to("/").into_response());
    };

    let filenames = state.uploads.store_batch(accepted).await?;

    let view = render(
        &current.session,
        "images",
        json!({ "filenames": filenames }),
    )
    .await?;
    Ok(view.into_response())
}

/// GET /display/{filename}
///
/// Permanent redirect to the static copy of the upload.
pub async fn display_image(Path(filename): Path<String>) -> Response {
    let location = format!("{}/{}", UPLOAD_URL_PREFIX, sanitize_filename(&filename));
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}
