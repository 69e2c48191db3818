use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use serde_json::json;

use crate::constants::MSG_REGISTERED;
use crate::credentials;
use crate::error::Result;
use crate::forms::{FormFields, LoginForm, RegistrationForm};
use crate::routes::render;
use crate::security::is_safe_redirect;
use crate::session::{CurrentUser, RequireUser};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// GET /register
pub async fn register_form(current: CurrentUser) -> Result<Response> {
    if current.identity.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let view = render(
        &current.session,
        "register",
        json!({ "fields": ["username", "email", "password", "checked_password"] }),
    )
    .await?;
    Ok(view.into_response())
}

/// POST /register
///
/// On success the user still has to log in; registration does not start a
/// session.
pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(fields): Form<FormFields>,
) -> Result<Response> {
    if current.identity.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let form = RegistrationForm::from_fields(&fields);
    form.validate(&state.db).await?;

    credentials::register(&state.db, &form.username, &form.email, &form.password).await?;

    current.session.flash("success", MSG_REGISTERED).await?;
    Ok(Redirect::to("/login").into_response())
}

/// GET /login
pub async fn login_form(current: CurrentUser, Query(query): Query<LoginQuery>) -> Result<Response> {
    if current.identity.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let view = render(
        &current.session,
        "login",
        json!({
            "fields": ["email", "password", "remember"],
            "next": query.next,
        }),
    )
    .await?;
    Ok(view.into_response())
}

/// POST /login
///
/// Redirects to `next` when it is a local path, otherwise to `/`.
pub async fn login(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<LoginQuery>,
    Form(fields): Form<FormFields>,
) -> Result<Response> {
    if current.identity.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let form = LoginForm::from_fields(&fields);
    form.validate()?;

    let user = credentials::verify(&state.db, &form.email, &form.password).await?;
    current.session.login(&user, form.remember).await?;

    let target = match query.next {
        Some(next) if is_safe_redirect(&next) => next,
        Some(next) => {
            tracing::warn!("Ignoring unsafe login redirect: {:?}", next);
            "/".to_string()
        }
        None => "/".to_string(),
    };

    Ok(Redirect::to(&target).into_response())
}

/// GET /logout
pub async fn logout(RequireUser { session, user }: RequireUser) -> Result<Redirect> {
    session.logout().await?;
    tracing::info!("User {} logged out", user.id);
    Ok(Redirect::to("/"))
}
