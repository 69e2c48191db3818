use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::constants::MSG_ACCOUNT_DELETED;
use crate::error::Result;
use crate::routes::ensure_self;
use crate::session::RequireUser;
use crate::AppState;

/// GET|POST /deleteAcc/{id}
///
/// Removes the account with all of its notes and notebooks, then ends the
/// session.
pub async fn delete_account(
    State(state): State<AppState>,
    RequireUser { session, user }: RequireUser,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    ensure_self(&user, id)?;

    state.db.delete_user_cascade(user.id).await?;

    session.logout().await?;
    session.flash("success", MSG_ACCOUNT_DELETED).await?;

    tracing::info!("Account {} deleted", user.id);
    Ok(Redirect::to("/"))
}
