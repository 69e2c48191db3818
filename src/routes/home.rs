use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::constants::HOME_PREVIEW_LIMIT;
use crate::error::Result;
use crate::routes::render;
use crate::session::{CurrentUser, Identity};
use crate::AppState;

/// GET /
///
/// Anonymous visitors get empty lists.
pub async fn index(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Value>> {
    let data = match &current.identity {
        Identity::User(user) => {
            let notebooks = state
                .db
                .recent_notebooks(user.id, HOME_PREVIEW_LIMIT)
                .await?;
            let notes = state.db.recent_notes(user.id, HOME_PREVIEW_LIMIT).await?;
            json!({ "user": user, "notebooks": notebooks, "notes": notes })
        }
        Identity::Anonymous => json!({ "user": null, "notebooks": [], "notes": [] }),
    };

    render(&current.session, "index", data).await
}
