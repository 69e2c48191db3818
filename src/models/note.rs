use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Notebook;

/// A user-owned text record, one row of the `notes` table
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Owning user (plain id, no back-reference)
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A note together with the notebooks it is attached to
#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    pub notebooks: Vec<Notebook>,
}
