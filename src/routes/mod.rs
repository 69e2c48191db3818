pub mod account;
pub mod auth;
pub mod health;
pub mod home;
pub mod notebooks;
pub mod notes;
pub mod uploads;

pub use account::delete_account;
pub use auth::{login, login_form, logout, register, register_form};
pub use health::health_check;
pub use home::index;
pub use notebooks::{
    create_notebook, delete_notebook, list_notebooks, new_notebook_form, update_notebook,
    update_notebook_form,
};
pub use notes::{
    create_note, delete_note, list_notes, new_note_form, note_details, update_note,
    update_note_form,
};
pub use uploads::{display_image, upload_form, upload_image};

use axum::Json;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::User;
use crate::session::SessionManager;

/// Build a view body: the view name, pending flashes and the view's data
///
/// Taking the flashes here means each notice is shown exactly once.
pub(crate) async fn render(session: &SessionManager, view: &str, data: Value) -> Result<Json<Value>> {
    let flashes = session.take_flashes().await?;
    let mut body = json!({
        "view": view,
        "flashes": flashes,
    });

    if let (Value::Object(body), Value::Object(data)) = (&mut body, data) {
        body.extend(data);
    }

    Ok(Json(body))
}

/// Reject `/user/<id>/...` style routes addressed at someone else
pub(crate) fn ensure_self(user: &User, id: i64) -> Result<()> {
    if user.id != id {
        tracing::warn!("User {} tried to act as user {}", user.id, id);
        return Err(AppError::Forbidden);
    }
    Ok(())
}
