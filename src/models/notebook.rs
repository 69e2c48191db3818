use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Note;

/// A user-owned named collection, one row of the `notebook` table
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Notebook {
    pub id: i64,
    pub title: String,
    /// Owning user (plain id, no back-reference)
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A notebook together with the notes attached to it
#[derive(Debug, Clone, Serialize)]
pub struct NotebookView {
    #[serde(flatten)]
    pub notebook: Notebook,
    pub notes: Vec<Note>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_flattens_notebook_fields() {
        let now = Utc::now();
        let view = NotebookView {
            notebook: Notebook {
                id: 7,
                title: "Work".to_string(),
                user_id: 1,
                created_at: now,
            },
            notes: vec![Note {
                id: 3,
                title: "Todo".to_string(),
                description: "ship it".to_string(),
                user_id: 1,
                created_at: now,
            }],
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["title"], "Work");
        assert_eq!(value["notes"][0]["title"], "Todo");
    }
}
