//! Cookie-backed session identity and flash notices.
//!
//! The session stores only the user id. Handlers never read ambient state:
//! they take [`CurrentUser`] or [`RequireUser`] as an explicit argument, and
//! both resolve the id against the database on every request.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::{cookie::time::Duration, Expiry, Session};
use tower_sessions_sqlx_store::SqliteStore;

use crate::constants::MSG_LOGIN_REQUIRED;
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

/// Key for storing the user id in the session
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Key for pending one-shot notices
const SESSION_FLASH_KEY: &str = "_flashes";

/// One-shot notice shown by the next rendered view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    /// `success`, `info` or `danger`
    pub category: String,
    pub message: String,
}

/// Who is making the current request
#[derive(Debug, Clone)]
pub enum Identity {
    User(User),
    Anonymous,
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }
}

/// Session records live in the app database, next to the users they name
///
/// The backing table is created by [`Db`]'s migrations.
pub fn session_store(db: &Db) -> SqliteStore {
    SqliteStore::new(db.pool().clone())
}

/// Thin wrapper over the request's session
#[derive(Clone)]
pub struct SessionManager {
    session: Session,
    remember_days: i64,
}

impl SessionManager {
    pub fn new(session: Session, remember_days: i64) -> Self {
        Self {
            session,
            remember_days,
        }
    }

    /// Bind `user` to this session under a fresh session id
    ///
    /// Without `remember` the cookie dies with the browser session; with it
    /// the session survives `remember_days` of inactivity.
    pub async fn login(&self, user: &User, remember: bool) -> Result<()> {
        self.session.cycle_id().await?;
        self.session.insert(SESSION_USER_ID_KEY, user.id).await?;

        let expiry = if remember {
            Expiry::OnInactivity(Duration::days(self.remember_days))
        } else {
            Expiry::OnSessionEnd
        };
        self.session.set_expiry(Some(expiry));

        tracing::info!("User {} logged in (remember: {})", user.id, remember);
        Ok(())
    }

    /// Resolve the bound user id; a vanished user counts as anonymous
    pub async fn current_user(&self, db: &Db) -> Result<Identity> {
        let Some(user_id) = self.session.get::<i64>(SESSION_USER_ID_KEY).await? else {
            return Ok(Identity::Anonymous);
        };

        match db.find_user(user_id).await? {
            Some(user) => Ok(Identity::User(user)),
            None => {
                tracing::warn!("Session bound to missing user {}", user_id);
                self.session.remove::<i64>(SESSION_USER_ID_KEY).await?;
                Ok(Identity::Anonymous)
            }
        }
    }

    /// Drop the bound identity; pending flashes survive
    pub async fn logout(&self) -> Result<()> {
        self.session.remove::<i64>(SESSION_USER_ID_KEY).await?;
        self.session.cycle_id().await?;
        self.session.set_expiry(Some(Expiry::OnSessionEnd));
        Ok(())
    }

    /// Queue a notice for the next rendered view
    pub async fn flash(&self, category: &str, message: &str) -> Result<()> {
        let mut flashes: Vec<Flash> = self
            .session
            .get(SESSION_FLASH_KEY)
            .await?
            .unwrap_or_default();
        flashes.push(Flash {
            category: category.to_string(),
            message: message.to_string(),
        });
        self.session.insert(SESSION_FLASH_KEY, flashes).await?;
        Ok(())
    }

    /// Remove and return every pending notice
    pub async fn take_flashes(&self) -> Result<Vec<Flash>> {
        Ok(self
            .session
            .remove::<Vec<Flash>>(SESSION_FLASH_KEY)
            .await?
            .unwrap_or_default())
    }
}

/// Extractor: the session plus whoever it belongs to (possibly nobody)
pub struct CurrentUser {
    pub session: SessionManager,
    pub identity: Identity,
}

impl CurrentUser {
    /// Guard for protected operations
    ///
    /// Anonymous callers get a login notice queued and an `Unauthorized`
    /// error that redirects to `/login?next=<next>`.
    pub async fn require_authenticated(self, next: &str) -> Result<RequireUser> {
        match self.identity {
            Identity::User(user) => Ok(RequireUser {
                session: self.session,
                user,
            }),
            Identity::Anonymous => {
                self.session.flash("info", MSG_LOGIN_REQUIRED).await?;
                Err(AppError::Unauthorized {
                    next: next.to_string(),
                })
            }
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let session = SessionManager::new(session, state.config.remember_days);

        let identity = session
            .current_user(&state.db)
            .await
            .map_err(IntoResponse::into_response)?;

        Ok(CurrentUser { session, identity })
    }
}

/// Extractor: an authenticated user, or a redirect to the login page
pub struct RequireUser {
    pub session: SessionManager,
    pub user: User,
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        current
            .require_authenticated(&next)
            .await
            .map_err(IntoResponse::into_response)
    }
}
